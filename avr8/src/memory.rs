use std::ops::Deref;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryOutOfBoundsError;

type MemoryResult<T> = Result<T, MemoryOutOfBoundsError>;

/// Flash image, addressed in 16-bit words like the AVR program counter
pub struct ProgramMemory {
    words: Vec<u16>,
}

impl Deref for ProgramMemory {
    type Target = [u16];

    fn deref(&self) -> &Self::Target {
        &self.words
    }
}

impl ProgramMemory {
    pub fn new(flash_size: usize) -> Self {
        Self {
            words: vec![0; flash_size / 2],
        }
    }

    /// Size in bytes
    pub fn capacity(&self) -> usize {
        self.words.len() * 2
    }

    /// Replace the image with little-endian `bytes`, zero filling the rest
    pub fn load_bytes(&mut self, bytes: &[u8]) -> MemoryResult<()> {
        if bytes.len() > self.capacity() {
            return Err(MemoryOutOfBoundsError);
        }

        self.words.fill(0);
        for (word, chunk) in self.words.iter_mut().zip(bytes.chunks(2)) {
            let hi = chunk.get(1).copied().unwrap_or(0);
            *word = u16::from_le_bytes([chunk[0], hi]);
        }

        Ok(())
    }

    pub fn read_word(&self, address: u32) -> MemoryResult<u16> {
        self.words
            .get(address as usize)
            .copied()
            .ok_or(MemoryOutOfBoundsError)
    }
}

/// Unified data space: register file, I/O registers, then SRAM
pub struct DataMemory {
    data: Vec<u8>,
}

impl Deref for DataMemory {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl DataMemory {
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    pub fn read_u8(&self, address: u16) -> MemoryResult<u8> {
        self.data
            .get(address as usize)
            .copied()
            .ok_or(MemoryOutOfBoundsError)
    }

    pub fn write_u8(&mut self, address: u16, value: u8) -> MemoryResult<()> {
        let slot = self
            .data
            .get_mut(address as usize)
            .ok_or(MemoryOutOfBoundsError)?;

        *slot = value;
        Ok(())
    }

    /// Register read for addresses already validated against the chip
    pub fn reg(&self, address: u16) -> u8 {
        self.read_u8(address).unwrap_or(0)
    }

    pub fn set_reg(&mut self, address: u16, value: u8) {
        if self.write_u8(address, value).is_err() {
            log::warn!("Dropped write of {value:#04X} to unmapped data address {address:#06X}");
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_memory_load() {
        let mut flash = ProgramMemory::new(8);
        assert_eq!(flash.capacity(), 8);

        flash.load_bytes(&[0x0C, 0x94, 0x34]).unwrap();
        assert_eq!(flash.read_word(0).unwrap(), 0x940C);
        assert_eq!(flash.read_word(1).unwrap(), 0x0034);
        assert_eq!(flash.read_word(3).unwrap(), 0);
        assert_eq!(flash.read_word(4).unwrap_err(), MemoryOutOfBoundsError);
    }

    #[test]
    fn test_program_memory_too_large() {
        let mut flash = ProgramMemory::new(4);
        assert_eq!(
            flash.load_bytes(&[0; 5]).unwrap_err(),
            MemoryOutOfBoundsError
        );
    }

    #[test]
    fn test_reload_clears_previous_image() {
        let mut flash = ProgramMemory::new(8);
        flash.load_bytes(&[0xFF; 8]).unwrap();
        flash.load_bytes(&[0x01, 0x00]).unwrap();
        assert_eq!(&flash[..], &[0x0001, 0, 0, 0]);
    }

    #[test]
    fn test_data_memory_access() {
        let mut data = DataMemory::new(0x100);

        data.write_u8(0x7A, 0x40).unwrap();
        assert_eq!(data.read_u8(0x7A).unwrap(), 0x40);
        assert_eq!(data.reg(0x7A), 0x40);

        data.set_reg(0x25, 0x20);
        assert_eq!(data.reg(0x25), 0x20);

        data.clear();
        assert!(data.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_data_memory_out_of_bounds() {
        let mut data = DataMemory::new(0x100);

        assert_eq!(data.read_u8(0x100).unwrap_err(), MemoryOutOfBoundsError);
        assert_eq!(
            data.write_u8(0x100, 0x12).unwrap_err(),
            MemoryOutOfBoundsError
        );
        assert_eq!(data.reg(0x100), 0);
    }
}
