use std::io::{self, Read};

use log::debug;

use super::{classify, is_license_file, LicenseOracle};

/// Passes a file's bytes through while keeping a copy when the file is a
/// license file. The copy is classified once, when the tee is dropped, and
/// the resulting ids are appended to `found`.
pub struct LicenseTee<'a, R> {
    inner: R,
    path: String,
    buffer: Option<Vec<u8>>,
    oracle: &'a dyn LicenseOracle,
    found: &'a mut Vec<String>,
}

impl<'a, R: Read> LicenseTee<'a, R> {
    pub fn new(
        inner: R,
        path: &str,
        oracle: &'a dyn LicenseOracle,
        found: &'a mut Vec<String>,
    ) -> Self {
        LicenseTee {
            inner,
            path: path.to_string(),
            buffer: is_license_file(path).then(Vec::new),
            oracle,
            found,
        }
    }
}

impl<R: Read> Read for LicenseTee<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        if let Some(buffer) = &mut self.buffer {
            buffer.extend_from_slice(&buf[..read]);
        }
        Ok(read)
    }
}

impl<R> Drop for LicenseTee<'_, R> {
    fn drop(&mut self) {
        if let Some(contents) = self.buffer.take() {
            let licenses = classify(self.oracle, &contents);
            debug!("{}: {:?}", self.path, licenses);
            self.found.extend(licenses);
        }
    }
}
