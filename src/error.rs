// src/error.rs
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errores del volcado. Todos son fatales: el binario reporta y termina.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("no se pudo abrir la imagen {path:?}: {source}")]
    ImageOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Lectura posicional que devolvió menos bytes que la estructura.
    /// Imagen truncada o metadatos corruptos se ven igual.
    #[error("lectura corta de {what} en el offset {offset}: esperados {expected} bytes, leídos {got}")]
    TruncatedRead {
        what: &'static str,
        offset: u64,
        expected: usize,
        got: usize,
    },

    #[error("error de E/S: {0}")]
    Io(#[from] io::Error),

    #[error("geometría inválida: {0}")]
    InvalidGeometry(String),

    #[error("entrada de directorio corrupta en el inodo {inode} (offset {offset}): {detail}")]
    CorruptDirEntry {
        inode: u64,
        offset: u64,
        detail: &'static str,
    },

    #[error("{0}")]
    Usage(String),
}

impl DumpError {
    /// Código de salida del proceso: 2 por mal uso, 3 si la imagen no abre,
    /// 1 para cualquier falla durante el volcado.
    pub fn exit_code(&self) -> i32 {
        match self {
            DumpError::Usage(_) => 2,
            DumpError::ImageOpen { .. } => 3,
            DumpError::TruncatedRead { .. }
            | DumpError::Io(_)
            | DumpError::InvalidGeometry(_)
            | DumpError::CorruptDirEntry { .. } => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, DumpError>;
