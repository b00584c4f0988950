/* Acceso a la imagen del filesystem.
Define el trait que usa el volcado para leer bytes por offset absoluto.
Hay dos implementaciones: un archivo real (pread) y una imagen en memoria
para las pruebas. Ninguna escribe. */

use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{DumpError, Result};

pub trait ImageReader {
    /// Lee hasta `buf.len()` bytes en `offset`. Devuelve cuántos se leyeron;
    /// menos que `buf.len()` solo si la imagen se acaba.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Lee exactamente `len` bytes de la estructura `what`.
    /// Una lectura corta es `TruncatedRead`.
    fn read_record(&self, what: &'static str, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let got = self.read_at(offset, &mut buf)?;
        if got != len {
            return Err(DumpError::TruncatedRead {
                what,
                offset,
                expected: len,
                got,
            });
        }
        Ok(buf)
    }
}

impl<T: ImageReader + ?Sized> ImageReader for &T {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }
}

// -----------------------------------------------------------------------------
// Imagen en disco
// -----------------------------------------------------------------------------

/// Imagen abierta en solo lectura. El handle vive todo el recorrido.
#[derive(Debug)]
pub struct FileImage {
    path: PathBuf,
    file: File,
}

impl FileImage {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| DumpError::ImageOpen {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "imagen abierta");

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageReader for FileImage {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        // pread puede devolver menos de lo pedido sin estar en EOF.
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.file.read_at(&mut buf[filled..], offset + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

// -----------------------------------------------------------------------------
// Imagen en memoria
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemImage {
    pub bytes: Vec<u8>,
}

impl MemImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl ImageReader for MemImage {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let len = self.bytes.len() as u64;
        if offset >= len {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.bytes.len() - start);
        buf[..n].copy_from_slice(&self.bytes[start..start + n]);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn mem_image_short_read_at_end() {
        let img = MemImage::new(vec![1, 2, 3, 4]);
        let mut buf = [0u8; 4];
        assert_eq!(img.read_at(2, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[3, 4]);
        assert_eq!(img.read_at(10, &mut buf).unwrap(), 0);
    }

    #[test]
    fn read_record_reports_truncation() {
        let img = MemImage::new(vec![0u8; 100]);
        let err = img.read_record("bitmap", 90, 20).unwrap_err();
        match err {
            DumpError::TruncatedRead {
                what,
                offset,
                expected,
                got,
            } => {
                assert_eq!(what, "bitmap");
                assert_eq!(offset, 90);
                assert_eq!(expected, 20);
                assert_eq!(got, 10);
            }
            other => panic!("error inesperado: {other:?}"),
        }
    }

    #[test]
    fn file_image_reads_at_offset() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"abcdefgh").unwrap();
        tmp.flush().unwrap();

        let img = FileImage::open(tmp.path()).unwrap();
        assert_eq!(img.read_record("prueba", 3, 4).unwrap(), b"defg");
        assert!(img.read_record("prueba", 6, 4).is_err());
    }

    #[test]
    fn file_image_open_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileImage::open(&dir.path().join("no-existe.img")).unwrap_err();
        assert!(matches!(err, DumpError::ImageOpen { .. }));
    }
}
