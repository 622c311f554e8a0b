//! Shared test helpers for building stores and downloaders in unit tests.

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::downloader::DocketDownloader;
use crate::planner::{DocketPrefixes, DownloadPlan};
use crate::progress::Console;
use crate::store::MemoryStore;
use crate::types::{Category, Dataset};

/// In-memory writer whose contents can be read back after being handed to a `Console`
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Plan for agency `EPA`, docket `D`, text and derived only
pub(crate) fn scenario_plan() -> DownloadPlan {
    let dataset = Dataset::new("EPA", "D").unwrap();
    DownloadPlan {
        prefixes: DocketPrefixes::new(&dataset),
        dataset,
        categories: vec![
            Category::Docket,
            Category::Documents,
            Category::Comments,
            Category::Derived,
        ],
    }
}

/// Store holding a docket `D` of agency `EPA` with the given number of
/// objects per text category, derived objects, and binary attachments
pub(crate) fn docket_store(
    docket: usize,
    documents: usize,
    comments: usize,
    derived: usize,
    binary: usize,
) -> MemoryStore {
    let text = "raw-data/EPA/D/text-D";
    let mut store = MemoryStore::new().with_page_size(4);
    for i in 0..docket {
        store.insert(format!("{text}/docket/D-{i}.json"), format!("docket {i}"));
    }
    for i in 0..documents {
        store.insert(
            format!("{text}/documents/D-{i:04}.json"),
            format!("document {i}"),
        );
    }
    for i in 0..comments {
        store.insert(
            format!("{text}/comments/D-{i:04}.json"),
            format!("comment {i}"),
        );
    }
    for i in 0..derived {
        store.insert(
            format!("derived-data/EPA/D/mirrulations/extracted_txt/D-{i}.txt"),
            format!("derived {i}"),
        );
    }
    for i in 0..binary {
        store.insert(
            format!("raw-data/EPA/D/binary-D/comments_attachments/D-{i}.pdf"),
            format!("%PDF {i}"),
        );
    }
    store
}

/// Downloader over `store` writing into `output`, with captured console output
pub(crate) fn create_test_downloader(
    store: Arc<MemoryStore>,
    output: &Path,
    include_binary: bool,
) -> (DocketDownloader, SharedBuffer) {
    let mut config = Config::default();
    config.download.output_folder = output.to_path_buf();
    config.download.include_binary = include_binary;

    let buffer = SharedBuffer::default();
    let downloader = DocketDownloader::with_store(config, store)
        .with_console(Console::from_writer(buffer.clone()));
    (downloader, buffer)
}

/// Dataset matching [`docket_store`]
pub(crate) fn scenario_dataset() -> Dataset {
    Dataset::new("EPA", "D").unwrap()
}
