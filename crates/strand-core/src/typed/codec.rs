//! ArgLayout - 引数バッファの固定長バイナリレイアウト
//!
//! launch する側と handler 側がバイト単位で合意するための trait。
//! 長さが `SIZE` と違うバッファは切り詰めも埋め合わせもせずにエラーにする。

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("argument layout {layout} expects {expected} bytes, got {actual}")]
pub struct ArgumentLayoutError {
    pub layout: &'static str,
    pub expected: usize,
    pub actual: usize,
}

/// Fixed-size, byte-exact argument layout.
pub trait ArgLayout: Sized + Send + Sync + 'static {
    /// Exact encoded length.
    const SIZE: usize;

    /// Write into `buf`, which is exactly `SIZE` bytes long.
    fn write_to(&self, buf: &mut [u8]);

    /// Read from `buf`, which is exactly `SIZE` bytes long.
    fn read_from(buf: &[u8]) -> Self;

    fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Self::SIZE];
        self.write_to(&mut buf);
        buf
    }

    fn decode(bytes: &[u8]) -> Result<Self, ArgumentLayoutError> {
        if bytes.len() != Self::SIZE {
            return Err(ArgumentLayoutError {
                layout: std::any::type_name::<Self>(),
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self::read_from(bytes))
    }
}

impl ArgLayout for () {
    const SIZE: usize = 0;

    fn write_to(&self, _buf: &mut [u8]) {}

    fn read_from(_buf: &[u8]) -> Self {}
}

impl ArgLayout for u8 {
    const SIZE: usize = 1;

    fn write_to(&self, buf: &mut [u8]) {
        buf[0] = *self;
    }

    fn read_from(buf: &[u8]) -> Self {
        buf[0]
    }
}

impl ArgLayout for u32 {
    const SIZE: usize = 4;

    fn write_to(&self, buf: &mut [u8]) {
        buf.copy_from_slice(&self.to_le_bytes());
    }

    fn read_from(buf: &[u8]) -> Self {
        let mut word = [0u8; 4];
        word.copy_from_slice(buf);
        u32::from_le_bytes(word)
    }
}

impl ArgLayout for u64 {
    const SIZE: usize = 8;

    fn write_to(&self, buf: &mut [u8]) {
        buf.copy_from_slice(&self.to_le_bytes());
    }

    fn read_from(buf: &[u8]) -> Self {
        let mut word = [0u8; 8];
        word.copy_from_slice(buf);
        u64::from_le_bytes(word)
    }
}
