//! SDO request encoding
//!
//! Only the expedited (single frame) requests are supported: an upload request to read an object,
//! and an expedited download of up to four bytes to write one. Segmented and block transfers are
//! not implemented.

/// Client command specifier for an initiate upload (read) request
pub const CCS_INITIATE_UPLOAD: u8 = 0x40;

/// Client command specifier bits for an initiate download (write) request
const CCS_INITIATE_DOWNLOAD: u8 = 0x20;
/// Expedited transfer flag
const EXPEDITED: u8 = 0x02;
/// Size indicated flag
const SIZE_INDICATED: u8 = 0x01;

/// The largest payload which can be sent in an expedited download
pub const MAX_EXPEDITED_SIZE: usize = 4;

/// Compute the command byte for an expedited download of `size` data bytes
///
/// The `n` field holds the number of unused bytes in the 4 byte data section, so a one byte write
/// is `0x2F`, a two byte write is `0x2B`, and a four byte write is `0x23`.
pub const fn expedited_download_cs(size: usize) -> u8 {
    let n = (MAX_EXPEDITED_SIZE - size) as u8;
    CCS_INITIATE_DOWNLOAD | (n << 2) | EXPEDITED | SIZE_INDICATED
}

/// An expedited SDO request to a server
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SdoRequest {
    /// Read a sub object
    InitiateUpload {
        /// Object index
        index: u16,
        /// Sub index
        sub: u8,
    },
    /// Write up to 4 bytes to a sub object
    ExpeditedDownload {
        /// Object index
        index: u16,
        /// Sub index
        sub: u8,
        /// Number of valid bytes in `data`
        size: u8,
        /// Data bytes, zero padded
        data: [u8; MAX_EXPEDITED_SIZE],
    },
}

impl SdoRequest {
    /// Create an upload request
    pub const fn initiate_upload(index: u16, sub: u8) -> Self {
        SdoRequest::InitiateUpload { index, sub }
    }

    /// Create an expedited download request
    ///
    /// The data is held in a fixed size array, so writes of more than four bytes cannot be
    /// expressed.
    pub const fn expedited_download<const N: usize>(index: u16, sub: u8, data: [u8; N]) -> Self {
        const { assert!(N > 0 && N <= MAX_EXPEDITED_SIZE) };
        let mut buf = [0; MAX_EXPEDITED_SIZE];
        let mut i = 0;
        while i < N {
            buf[i] = data[i];
            i += 1;
        }
        SdoRequest::ExpeditedDownload {
            index,
            sub,
            size: N as u8,
            data: buf,
        }
    }

    /// Serialize the request into the 8 byte SDO frame payload
    pub const fn to_bytes(&self) -> [u8; 8] {
        match *self {
            SdoRequest::InitiateUpload { index, sub } => {
                let index = index.to_le_bytes();
                [CCS_INITIATE_UPLOAD, index[0], index[1], sub, 0, 0, 0, 0]
            }
            SdoRequest::ExpeditedDownload {
                index,
                sub,
                size,
                data,
            } => {
                let index = index.to_le_bytes();
                [
                    expedited_download_cs(size as usize),
                    index[0],
                    index[1],
                    sub,
                    data[0],
                    data[1],
                    data[2],
                    data[3],
                ]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_specifiers() {
        assert_eq!(0x2F, expedited_download_cs(1));
        assert_eq!(0x2B, expedited_download_cs(2));
        assert_eq!(0x27, expedited_download_cs(3));
        assert_eq!(0x23, expedited_download_cs(4));
    }

    #[test]
    fn test_request_layout() {
        assert_eq!(
            [0x40, 0x08, 0x10, 0x00, 0, 0, 0, 0],
            SdoRequest::initiate_upload(0x1008, 0).to_bytes()
        );
        assert_eq!(
            [0x2B, 0x00, 0x22, 0x00, 0x03, 0x01, 0x00, 0x00],
            SdoRequest::expedited_download(0x2200, 0, [0x03, 0x01]).to_bytes()
        );
    }
}
