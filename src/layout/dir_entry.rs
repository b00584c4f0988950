use super::{read_u16_le, read_u32_le, read_u8};

/// Cabecera fija: inode (4), rec_len (2), name_len (1), file_type (1).
pub const DIR_ENTRY_HEADER: usize = 8;
/// rec_len siempre es múltiplo de 4.
pub const DIR_ENTRY_ALIGN: usize = 4;

/// Entrada de directorio de ext2 (formato con file_type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub inode: u32,
    pub rec_len: u16,
    pub name_len: u8,
    pub file_type: u8,
    /// Exactamente `name_len` bytes, sin terminador.
    pub name: Vec<u8>,
}

impl DirEntry {
    /// rec_len que no respeta la alineación de 4 bytes.
    pub fn is_misaligned(&self) -> bool {
        self.rec_len as usize % DIR_ENTRY_ALIGN != 0
    }
}

/// Resultado de decodificar una posición dentro de un bloque de directorio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirSlot {
    Entry(DirEntry),
    /// rec_len o name_len en cero: no hay más entradas útiles.
    End,
}

/// Decodifica la entrada que empieza en `offset` dentro de `block`.
///
/// Devuelve `Err` con una descripción cuando la entrada no cabe en el bloque;
/// el llamador agrega el contexto (inodo, offset).
pub fn decode(block: &[u8], offset: usize) -> Result<DirSlot, &'static str> {
    if offset + DIR_ENTRY_HEADER > block.len() {
        return Err("la cabecera se sale del bloque");
    }

    let inode = read_u32_le(block, offset);
    let rec_len = read_u16_le(block, offset + 4);
    let name_len = read_u8(block, offset + 6);
    let file_type = read_u8(block, offset + 7);

    if rec_len == 0 || name_len == 0 {
        return Ok(DirSlot::End);
    }

    let name_start = offset + DIR_ENTRY_HEADER;
    let name_end = name_start + name_len as usize;

    if (rec_len as usize) < DIR_ENTRY_HEADER + name_len as usize {
        return Err("rec_len menor que la cabecera más el nombre");
    }
    if name_end > block.len() {
        return Err("el nombre se sale del bloque");
    }

    Ok(DirSlot::Entry(DirEntry {
        inode,
        rec_len,
        name_len,
        file_type,
        name: block[name_start..name_end].to_vec(),
    }))
}
