//! Helpers for building test downloaders with captured console output

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use docket_dl::{Config, Console, DocketDownloader, ObjectStore};

/// Writer that keeps everything written to it
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Everything written so far
    pub fn contents(&self) -> String {
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

/// Configuration writing into `output`
pub fn test_config(output: &Path, include_binary: bool) -> Config {
    let mut config = Config::default();
    config.download.output_folder = output.to_path_buf();
    config.download.include_binary = include_binary;
    config
}

/// Downloader over `store` whose console output is captured
pub fn create_test_downloader(
    store: Arc<dyn ObjectStore>,
    config: Config,
) -> (DocketDownloader, SharedBuffer) {
    let output = SharedBuffer::default();
    let downloader = DocketDownloader::with_store(config, store)
        .with_console(Console::from_writer(output.clone()));
    (downloader, output)
}
