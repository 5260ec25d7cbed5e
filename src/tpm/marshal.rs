// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Big-endian TPM wire format primitives.

use super::errors::Error;

/// Bounds-checked reader over a marshalled TPM structure
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn read_bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8], Error> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                Error::Syntax(format!(
                    "{what}: need {len} bytes at offset {}, have {}",
                    self.offset,
                    self.data.len() - self.offset
                ))
            })?;

        let bytes = &self.data[self.offset..end];
        self.offset = end;

        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N], Error> {
        let mut a = [0u8; N];
        a.copy_from_slice(self.read_bytes(N, what)?);
        Ok(a)
    }

    pub fn read_u8(&mut self, what: &str) -> Result<u8, Error> {
        Ok(self.read_array::<1>(what)?[0])
    }

    pub fn read_u16(&mut self, what: &str) -> Result<u16, Error> {
        Ok(u16::from_be_bytes(self.read_array(what)?))
    }

    pub fn read_u32(&mut self, what: &str) -> Result<u32, Error> {
        Ok(u32::from_be_bytes(self.read_array(what)?))
    }

    pub fn read_u64(&mut self, what: &str) -> Result<u64, Error> {
        Ok(u64::from_be_bytes(self.read_array(what)?))
    }

    /// TPM2B: u16 size followed by that many bytes
    pub fn read_tpm2b(&mut self, what: &str) -> Result<Vec<u8>, Error> {
        let size = self.read_u16(what)? as usize;
        Ok(self.read_bytes(size, what)?.to_vec())
    }

    /// Fails if anything is left after the structure
    pub fn finish(self, what: &str) -> Result<(), Error> {
        let left = self.data.len() - self.offset;

        if left != 0 {
            return Err(Error::Syntax(format!(
                "{what}: {left} trailing bytes at offset {}",
                self.offset
            )));
        }

        Ok(())
    }
}

/// Appends marshalled TPM values to a buffer
#[derive(Default)]
pub(crate) struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn tpm2b(&mut self, v: &[u8], what: &str) -> Result<&mut Self, Error> {
        let size = u16::try_from(v.len())
            .map_err(|_| Error::Syntax(format!("{what}: {} bytes do not fit a TPM2B", v.len())))?;

        self.u16(size);
        self.buf.extend_from_slice(v);

        Ok(self)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
