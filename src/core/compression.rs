// Compression backends for stored day files

use crate::core::constants::CompressionType;
use crate::core::error::{Result, WindCubeError};
use flate2::read::GzDecoder;
use std::io::Read;

pub fn decompress(data: Vec<u8>, compression: CompressionType) -> Result<Vec<u8>> {
    match compression {
        CompressionType::None => Ok(data),

        CompressionType::Gzip => {
            let mut decoder = GzDecoder::new(data.as_slice());
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| WindCubeError::Decompression(format!("Gzip: {}", e)))?;
            Ok(decompressed)
        }

        #[cfg(feature = "lz4")]
        CompressionType::Lz4 => {
            let mut decoder = lz4::Decoder::new(data.as_slice())
                .map_err(|e| WindCubeError::Decompression(format!("LZ4: {}", e)))?;
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| WindCubeError::Decompression(format!("LZ4: {}", e)))?;
            Ok(decompressed)
        }

        #[cfg(not(feature = "lz4"))]
        CompressionType::Lz4 => Err(WindCubeError::UnsupportedCompression(2)),

        #[cfg(feature = "zstd")]
        CompressionType::Zstd => zstd::decode_all(data.as_slice())
            .map_err(|e| WindCubeError::Decompression(format!("Zstd: {}", e))),

        #[cfg(not(feature = "zstd"))]
        CompressionType::Zstd => Err(WindCubeError::UnsupportedCompression(3)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &[u8] = b"Timestamp\tWC_Pressure [hPa]\n2020/10/07 00:00:00\t1012.5\n";

    #[test]
    fn test_decompress_none() {
        let result = decompress(TEXT.to_vec(), CompressionType::None).unwrap();
        assert_eq!(result, TEXT);
    }

    #[test]
    fn test_decompress_gzip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(TEXT).unwrap();
        let compressed = encoder.finish().unwrap();

        let decompressed = decompress(compressed, CompressionType::Gzip).unwrap();
        assert_eq!(decompressed, TEXT);
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn test_decompress_zstd() {
        let compressed = zstd::encode_all(TEXT, 0).unwrap();
        let decompressed = decompress(compressed, CompressionType::Zstd).unwrap();
        assert_eq!(decompressed, TEXT);
    }

    #[cfg(feature = "lz4")]
    #[test]
    fn test_decompress_lz4() {
        use std::io::Write;

        let mut encoder = lz4::EncoderBuilder::new().build(Vec::new()).unwrap();
        encoder.write_all(TEXT).unwrap();
        let (compressed, result) = encoder.finish();
        result.unwrap();

        let decompressed = decompress(compressed, CompressionType::Lz4).unwrap();
        assert_eq!(decompressed, TEXT);
    }

    #[test]
    fn test_decompress_garbage_gzip() {
        let err = decompress(b"not gzip".to_vec(), CompressionType::Gzip).unwrap_err();
        assert!(matches!(err, WindCubeError::Decompression(_)));
    }
}
