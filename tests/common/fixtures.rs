//! Bucket fixtures: docket layouts and a fake S3 endpoint

use std::collections::BTreeMap;

use docket_dl::MemoryStore;
use wiremock::{Request, Respond, ResponseTemplate};

/// Agency of the scenario docket
pub const AGENCY: &str = "EPA";
/// Identifier of the scenario docket
pub const DOCKET_ID: &str = "EPA-HQ-OW-2020-0001";

/// Object counts per category of a fixture docket
#[derive(Clone, Copy, Debug, Default)]
pub struct DocketShape {
    pub docket: usize,
    pub documents: usize,
    pub comments: usize,
    pub derived: usize,
    pub binary: usize,
}

impl DocketShape {
    /// 3 docket, 5 document, 2 comment, 4 derived, no binary objects
    pub fn scenario() -> Self {
        Self {
            docket: 3,
            documents: 5,
            comments: 2,
            derived: 4,
            binary: 0,
        }
    }

    /// Text-group total
    pub fn text_total(&self) -> usize {
        self.docket + self.documents + self.comments + self.derived
    }
}

/// Keys and bodies of a fixture docket, as laid out in the bucket
pub fn docket_objects(shape: DocketShape) -> BTreeMap<String, String> {
    let text = format!("raw-data/{AGENCY}/{DOCKET_ID}/text-{DOCKET_ID}");
    let binary = format!("raw-data/{AGENCY}/{DOCKET_ID}/binary-{DOCKET_ID}");
    let derived = format!("derived-data/{AGENCY}/{DOCKET_ID}");

    let mut objects = BTreeMap::new();
    for i in 0..shape.docket {
        objects.insert(
            format!("{text}/docket/{DOCKET_ID}-{i}.json"),
            format!("{{\"docket\": {i}}}"),
        );
    }
    for i in 0..shape.documents {
        objects.insert(
            format!("{text}/documents/{DOCKET_ID}-{i:04}.json"),
            format!("{{\"document\": {i}}}"),
        );
    }
    for i in 0..shape.comments {
        objects.insert(
            format!("{text}/comments/{DOCKET_ID}-{i:04}.json"),
            format!("{{\"comment\": {i}}}"),
        );
    }
    for i in 0..shape.derived {
        objects.insert(
            format!("{derived}/mirrulations/extracted_txt/comment_{i}.txt"),
            format!("extracted text {i}"),
        );
    }
    for i in 0..shape.binary {
        objects.insert(
            format!("{binary}/comments_attachments/{DOCKET_ID}-{i:04}_attachment_1.pdf"),
            format!("%PDF-1.4 attachment {i}"),
        );
    }
    objects
}

/// In-memory bucket holding a fixture docket
pub fn docket_store(shape: DocketShape) -> MemoryStore {
    docket_objects(shape)
        .into_iter()
        .fold(MemoryStore::new().with_page_size(2), |store, (key, body)| {
            store.with_object(key, body)
        })
}

/// Serves a bucket over the S3 REST API, path-style, for a wiremock server.
///
/// `GET /<bucket>?list-type=2&prefix=..` answers with a `ListObjectsV2`
/// page; `GET /<bucket>/<key>` answers with the object body, or a
/// `NoSuchKey` error.
pub struct BucketResponder {
    pub bucket: String,
    pub objects: BTreeMap<String, String>,
    pub page_size: usize,
}

impl Respond for BucketResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let query: BTreeMap<String, String> = request.url.query_pairs().into_owned().collect();
        let bucket_root = format!("/{}/", self.bucket);

        if query.get("list-type").map(String::as_str) == Some("2") {
            let prefix = query.get("prefix").cloned().unwrap_or_default();
            let max_keys = query
                .get("max-keys")
                .and_then(|m| m.parse().ok())
                .unwrap_or(self.page_size)
                .min(self.page_size);
            let after = query.get("continuation-token").cloned();
            return ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml")
                .set_body_string(self.listing(&prefix, after.as_deref(), max_keys));
        }

        let body = request
            .url
            .path()
            .strip_prefix(&bucket_root)
            .and_then(|key| self.objects.get(key));
        match body {
            Some(body) => ResponseTemplate::new(200).set_body_string(body.clone()),
            None => ResponseTemplate::new(404)
                .insert_header("content-type", "application/xml")
                .set_body_string(
                    "<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>",
                ),
        }
    }
}

impl BucketResponder {
    fn listing(&self, prefix: &str, after: Option<&str>, max_keys: usize) -> String {
        let mut matching = self
            .objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .filter(|k| after.is_none_or(|a| k.as_str() > a));
        let page: Vec<&String> = matching.by_ref().take(max_keys).collect();
        let truncated = matching.next().is_some();

        let contents: String = page
            .iter()
            .map(|k| format!("<Contents><Key>{k}</Key><Size>1</Size></Contents>"))
            .collect();
        let token = match (truncated, page.last()) {
            (true, Some(last)) => format!("<NextContinuationToken>{last}</NextContinuationToken>"),
            _ => String::new(),
        };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>{}</Name><Prefix>{prefix}</Prefix><KeyCount>{}</KeyCount><IsTruncated>{truncated}</IsTruncated>{contents}{token}</ListBucketResult>"#,
            self.bucket,
            page.len()
        )
    }
}
