use std::io::{BufRead, Read, Seek};

use ::elf::{
    abi::{SHF_ALLOC, SHF_WRITE, SHT_NOBITS},
    endian::{AnyEndian, EndianParse},
    ElfStream, ParseError,
};
use log::debug;
use thiserror::Error;

/// Berkeley-style size breakdown of a built image.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SizeReport {
    pub text: u64,
    pub data: u64,
    pub bss: u64,
}

impl SizeReport {
    /// Bytes that end up in flash: code plus initialized data.
    pub fn flash_total(&self) -> u64 {
        self.text + self.data
    }

    /// Bytes that end up in RAM: initialized data plus zero-initialized data.
    pub fn ram_total(&self) -> u64 {
        self.data + self.bss
    }
}

#[derive(Error, Debug)]
pub enum ImageSizeError {
    #[error("Failed to open elf file")]
    FailedToOpenElfFile(ParseError),
    #[error("Failed to read hex file")]
    FailedToReadHexFile(std::io::Error),
    #[error("Malformed Intel HEX record on line {0}")]
    MalformedHexRecord(usize),
}

pub fn open_elf<T: Read + Seek>(input: T) -> Result<ElfStream<AnyEndian, T>, ImageSizeError> {
    ElfStream::<AnyEndian, _>::open_stream(input).map_err(ImageSizeError::FailedToOpenElfFile)
}

/// Tallies allocatable sections the way `size` does: non-writable progbits
/// count as text (code and rodata), writable progbits as data, nobits as bss.
pub fn elf_sizes<E: EndianParse, S: Read + Seek>(elf: &ElfStream<E, S>) -> SizeReport {
    let mut report = SizeReport::default();

    for section in elf.section_headers() {
        if section.sh_flags & SHF_ALLOC as u64 == 0 {
            continue;
        }

        if section.sh_type == SHT_NOBITS {
            report.bss += section.sh_size;
        } else if section.sh_flags & SHF_WRITE as u64 != 0 {
            report.data += section.sh_size;
        } else {
            report.text += section.sh_size;
        }
    }

    debug!(
        "text {:#x} data {:#x} bss {:#x}",
        report.text, report.data, report.bss
    );

    report
}

/// Sums the payload bytes of the data records (type 00) in an Intel HEX
/// stream. Record format is `:LLAAAATT[DD..]CC`; lines that do not start
/// with a colon are ignored.
pub fn hex_data_bytes(input: impl BufRead) -> Result<u64, ImageSizeError> {
    let mut total = 0;

    for (index, line) in input.lines().enumerate() {
        let line = line.map_err(ImageSizeError::FailedToReadHexFile)?;
        let line = line.trim();

        if !line.starts_with(':') {
            continue;
        }
        if line.len() < 11 || !line.is_ascii() {
            return Err(ImageSizeError::MalformedHexRecord(index + 1));
        }

        let byte_count = u8::from_str_radix(&line[1..3], 16)
            .map_err(|_| ImageSizeError::MalformedHexRecord(index + 1))?;
        let record_type = u8::from_str_radix(&line[7..9], 16)
            .map_err(|_| ImageSizeError::MalformedHexRecord(index + 1))?;

        if record_type == 0x00 {
            total += u64::from(byte_count);
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::elf::abi::{SHF_EXECINSTR, SHT_PROGBITS};
    use std::io::Cursor;

    fn push_u16(buf: &mut Vec<u8>, value: u16) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    fn push_u32(buf: &mut Vec<u8>, value: u32) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    fn section(buf: &mut Vec<u8>, sh_type: u32, sh_flags: u32, sh_size: u32) {
        push_u32(buf, 0); // sh_name
        push_u32(buf, sh_type);
        push_u32(buf, sh_flags);
        push_u32(buf, 0); // sh_addr
        push_u32(buf, 0); // sh_offset
        push_u32(buf, sh_size);
        push_u32(buf, 0); // sh_link
        push_u32(buf, 0); // sh_info
        push_u32(buf, 0); // sh_addralign
        push_u32(buf, 0); // sh_entsize
    }

    /// Hand-built little-endian ELF32 for ARM with only an ELF header and
    /// section headers, enough for the size walk.
    fn minimal_elf(sections: &[(u32, u32, u32)]) -> Vec<u8> {
        let mut buf = Vec::new();

        buf.extend_from_slice(&[0x7f, b'E', b'L', b'F', 1, 1, 1]);
        buf.resize(16, 0);

        push_u16(&mut buf, 2); // ET_EXEC
        push_u16(&mut buf, 40); // EM_ARM
        push_u32(&mut buf, 1); // EV_CURRENT
        push_u32(&mut buf, 0); // e_entry
        push_u32(&mut buf, 0); // e_phoff
        push_u32(&mut buf, 52); // e_shoff, right after the header
        push_u32(&mut buf, 0); // e_flags
        push_u16(&mut buf, 52); // e_ehsize
        push_u16(&mut buf, 32); // e_phentsize
        push_u16(&mut buf, 0); // e_phnum
        push_u16(&mut buf, 40); // e_shentsize
        push_u16(&mut buf, sections.len() as u16 + 1); // e_shnum, incl. null
        push_u16(&mut buf, 0); // e_shstrndx

        section(&mut buf, 0, 0, 0); // SHT_NULL
        for (sh_type, sh_flags, sh_size) in sections {
            section(&mut buf, *sh_type, *sh_flags, *sh_size);
        }

        buf
    }

    #[test]
    fn elf_sizes_follow_berkeley_size_rules() {
        let image = minimal_elf(&[
            (SHT_PROGBITS, SHF_ALLOC | SHF_EXECINSTR, 0x4000), // .text
            (SHT_PROGBITS, SHF_ALLOC, 0x800),                  // .rodata
            (SHT_PROGBITS, SHF_ALLOC | SHF_WRITE, 0x300),      // .data
            (SHT_NOBITS, SHF_ALLOC | SHF_WRITE, 0x1200),       // .bss
            (SHT_PROGBITS, 0, 0x9000),                         // .debug_info
        ]);

        let elf = open_elf(Cursor::new(image)).unwrap();
        let report = elf_sizes(&elf);

        assert_eq!(report.text, 0x4800);
        assert_eq!(report.data, 0x300);
        assert_eq!(report.bss, 0x1200);
        assert_eq!(report.flash_total(), 0x4b00);
        assert_eq!(report.ram_total(), 0x1500);
    }

    #[test]
    fn open_elf_rejects_non_elf_input() {
        assert!(matches!(
            open_elf(Cursor::new(b"not an elf".to_vec())),
            Err(ImageSizeError::FailedToOpenElfFile(_))
        ));
    }

    #[test]
    fn hex_data_bytes_counts_only_data_records() {
        let hex = ":10000000000102030405060708090A0B0C0D0E0F78\n\
                   :100010000102030405060708090A0B0C0D0E0F1068\n\
                   :04001000FFFFFFFFF0\n\
                   :020000040000FA\n\
                   :00000001FF\n";

        let total = hex_data_bytes(Cursor::new(hex)).unwrap();
        assert_eq!(total, 16 + 16 + 4);
    }

    #[test]
    fn hex_data_bytes_skips_non_record_lines() {
        let hex = "some junk header\n:00000001FF\n";
        assert_eq!(hex_data_bytes(Cursor::new(hex)).unwrap(), 0);
    }

    #[test]
    fn hex_data_bytes_rejects_truncated_records() {
        let hex = ":1000\n";
        assert!(matches!(
            hex_data_bytes(Cursor::new(hex)),
            Err(ImageSizeError::MalformedHexRecord(1))
        ));
    }
}
