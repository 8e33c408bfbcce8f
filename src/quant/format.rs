//! On-disk layout of a quantized classifier.
//!
//! ```text
//! [0..4)  magic  b"KPQ\0"
//! [4..8)  format version, u32 little-endian
//! [8..)   bincode-encoded QuantizedClassifier
//! ```

use std::{fs, io, path::Path};

use thiserror::Error;

use super::QuantizedClassifier;

pub const MAGIC: [u8; 4] = *b"KPQ\0";
pub const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum QuantError {
    #[error("not a quantized classifier file (bad magic)")]
    BadMagic,

    #[error("unsupported quantized format version {0}")]
    UnsupportedVersion(u32),

    #[error("file is truncated")]
    Truncated,

    #[error("layer {layer}: {detail}")]
    Shape { layer: usize, detail: String },

    #[error("cannot decode model: {0}")]
    Decode(#[from] bincode::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub fn to_bytes(model: &QuantizedClassifier) -> Result<Vec<u8>, QuantError> {
    model.validate()?;
    let payload = bincode::serialize(model)?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

pub fn from_bytes(bytes: &[u8]) -> Result<QuantizedClassifier, QuantError> {
    if bytes.len() < HEADER_LEN {
        return Err(if bytes.starts_with(&MAGIC[..bytes.len().min(4)]) {
            QuantError::Truncated
        } else {
            QuantError::BadMagic
        });
    }
    if bytes[..4] != MAGIC {
        return Err(QuantError::BadMagic);
    }

    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != FORMAT_VERSION {
        return Err(QuantError::UnsupportedVersion(version));
    }

    let model: QuantizedClassifier = bincode::deserialize(&bytes[HEADER_LEN..])?;
    model.validate()?;
    Ok(model)
}

/// Write the model and return the file size in bytes.
pub fn save(model: &QuantizedClassifier, path: &Path) -> Result<u64, QuantError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let bytes = to_bytes(model)?;
    fs::write(path, &bytes)?;
    Ok(bytes.len() as u64)
}

pub fn load(path: &Path) -> Result<QuantizedClassifier, QuantError> {
    from_bytes(&fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quant::{Activation, QuantizedDense};

    fn tiny() -> QuantizedClassifier {
        QuantizedClassifier {
            layers: vec![
                QuantizedDense::from_float(&[0.3, -0.2, 0.1, 0.9], vec![0.1, 0.0], 2, 2, Activation::Relu),
                QuantizedDense::from_float(&[1.0, -1.0, 0.5, 0.25, -0.5, 0.0], vec![0.0; 3], 2, 3, Activation::Softmax),
            ],
        }
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.kpq");

        let size = save(&tiny(), &path).unwrap();
        assert_eq!(size, fs::metadata(&path).unwrap().len());

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, tiny());
        assert_eq!(
            loaded.predict(&[0.4, -0.3]).unwrap(),
            tiny().predict(&[0.4, -0.3]).unwrap()
        );
    }

    #[test]
    fn test_header_is_checked() {
        let mut bytes = to_bytes(&tiny()).unwrap();
        assert_eq!(&bytes[..4], b"KPQ\0");

        bytes[4] = 9;
        assert!(matches!(from_bytes(&bytes), Err(QuantError::UnsupportedVersion(9))));

        assert!(matches!(from_bytes(b"PK\x03\x04rest"), Err(QuantError::BadMagic)));
        assert!(matches!(from_bytes(b"KPQ"), Err(QuantError::Truncated)));
    }

    #[test]
    fn test_truncated_payload_fails_to_decode() {
        let bytes = to_bytes(&tiny()).unwrap();
        let cut = &bytes[..bytes.len() - 5];
        assert!(matches!(from_bytes(cut), Err(QuantError::Decode(_))));
    }

    #[test]
    fn test_inconsistent_model_is_rejected() {
        let mut broken = tiny();
        broken.layers[1].scales.pop();
        assert!(matches!(to_bytes(&broken), Err(QuantError::Shape { layer: 1, .. })));
    }
}
