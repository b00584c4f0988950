/// Bitmap de un grupo: un bloque de bytes, un bit por bloque o inodo.
/// Bit en 0 = libre, bit en 1 = usado. LSB primero dentro de cada byte.
#[derive(Debug, Clone)]
pub struct Bitmap {
    bytes: Vec<u8>,
}

impl Bitmap {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Cantidad de bits que cubre el buffer.
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8
    }

    #[inline]
    pub fn is_set(&self, bit: usize) -> bool {
        let byte = self.bytes[bit / 8];
        byte & (1u8 << (bit % 8)) != 0
    }

    /// Posiciones libres (bit en 0) en `0..count`, en orden ascendente.
    /// `count` nunca pasa del largo del bitmap.
    pub fn free_positions(&self, count: usize) -> impl Iterator<Item = usize> + '_ {
        let limit = count.min(self.bit_len());
        (0..limit).filter(move |&bit| !self.is_set(bit))
    }
}

/// Número global (base 1) del bloque libre en la posición `bit` del grupo.
pub fn free_block_number(group: u32, blocks_per_group: u32, bit: usize) -> u64 {
    group as u64 * blocks_per_group as u64 + bit as u64 + 1
}

/// Número del inodo libre: posición dentro del grupo más uno. No se desplaza
/// por el grupo, a diferencia de los bloques.
pub fn free_inode_number(bit: usize) -> u64 {
    bit as u64 + 1
}
