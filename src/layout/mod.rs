pub mod dir_entry;
pub mod group;
pub mod inode;
pub mod superblock;

// Lectura little-endian campo por campo. El llamador valida el largo antes.
#[inline]
pub(crate) fn read_u8(data: &[u8], offset: usize) -> u8 {
    data[offset]
}

#[inline]
pub(crate) fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

#[inline]
pub(crate) fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
