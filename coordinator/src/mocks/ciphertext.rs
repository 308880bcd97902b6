use crate::{Ciphertext, Handle};

/// Modulus of the field mock values live in (`2^61 - 1`).
pub const MODULUS: u64 = (1 << 61) - 1;

fn mul(a: u64, b: u64) -> u64 {
    ((a as u128 * b as u128) % MODULUS as u128) as u64
}

fn pow(mut base: u64, mut exp: u64) -> u64 {
    let mut result = 1;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul(result, base);
        }
        base = mul(base, base);
        exp >>= 1;
    }
    result
}

/// A value multiplicatively masked by a [Key].
///
/// Masking is linear, so sums and scalar multiples of masked values unmask to the sums and
/// scalar multiples of the underlying values (modulo [MODULUS]). This provides no security
/// whatsoever.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Masked(u64);

impl Masked {
    /// Recover a [Masked] value from its [Handle].
    pub fn from_handle(handle: &Handle) -> Option<Self> {
        let (value, padding) = handle.as_ref().split_at(8);
        if padding.iter().any(|b| *b != 0) {
            return None;
        }
        let value = u64::from_be_bytes(value.try_into().ok()?);
        if value >= MODULUS {
            return None;
        }
        Some(Self(value))
    }
}

impl Ciphertext for Masked {
    fn add(&self, other: &Self) -> Self {
        Self((self.0 + other.0) % MODULUS)
    }

    fn scalar_multiply(&self, scalar: u64) -> Self {
        Self(mul(self.0, scalar % MODULUS))
    }

    fn handle(&self) -> Handle {
        let mut handle = [0u8; 32];
        handle[..8].copy_from_slice(&self.0.to_be_bytes());
        Handle::from(handle)
    }
}

/// Secret used to mask and unmask values.
#[derive(Clone, Copy, Debug)]
pub struct Key {
    mask: u64,
    unmask: u64,
}

impl Key {
    /// Derive a [Key] from `seed`.
    pub fn new(seed: u64) -> Self {
        let mask = seed % (MODULUS - 1) + 1;
        Self {
            mask,
            unmask: pow(mask, MODULUS - 2),
        }
    }

    pub fn encrypt(&self, value: u64) -> Masked {
        Masked(mul(value % MODULUS, self.mask))
    }

    pub fn decrypt(&self, ciphertext: &Masked) -> u64 {
        mul(ciphertext.0, self.unmask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        let key = Key::new(42);
        let a = key.encrypt(1_000);
        let b = key.encrypt(234);
        assert_eq!(key.decrypt(&a), 1_000);
        assert_eq!(key.decrypt(&a.add(&b)), 1_234);
        assert_eq!(key.decrypt(&a.scalar_multiply(3)), 3_000);
        assert_eq!(a.add(&b), b.add(&a));
    }

    #[test]
    fn test_handle() {
        let key = Key::new(42);
        let a = key.encrypt(99);
        assert_eq!(Masked::from_handle(&a.handle()), Some(a));
        assert_ne!(a.handle(), key.encrypt(100).handle());

        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        assert_eq!(Masked::from_handle(&Handle::from(bytes)), None);
        let bytes = [0xffu8; 32];
        assert_eq!(Masked::from_handle(&Handle::from(bytes)), None);
    }
}
