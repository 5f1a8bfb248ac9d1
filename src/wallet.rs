use alloy::{primitives::Address, signers::local::PrivateKeySigner};

use crate::error::DeployError;

/// Builds a signer from a hex private key, with or without `0x`.
pub fn signer(private_key: &str) -> Result<PrivateKeySigner, DeployError> {
    let key = private_key.trim();
    let key = key.strip_prefix("0x").unwrap_or(key);
    let bytes = hex::decode(key).map_err(|e| DeployError::InvalidKey(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(DeployError::InvalidKey(format!(
            "expected 32 bytes, got {}",
            bytes.len()
        )));
    }

    PrivateKeySigner::from_slice(&bytes).map_err(|e| DeployError::InvalidKey(e.to_string()))
}

/// The address controlled by `private_key`.
pub fn sender_address(private_key: &str) -> Result<Address, DeployError> {
    Ok(signer(private_key)?.address())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use crate::error::DeployError;

    use super::sender_address;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn derives_address_with_and_without_prefix() {
        let expected = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert_eq!(sender_address(KEY).unwrap(), expected);
        assert_eq!(sender_address(&KEY[2..]).unwrap(), expected);
    }

    #[test]
    fn rejects_malformed_keys() {
        for key in ["", "0x", "0xzz", "0x1234", "--PLEASE ADD YOUR PRIVATE KEY HERE--"] {
            assert!(matches!(sender_address(key), Err(DeployError::InvalidKey(_))), "{key}");
        }
    }

    #[test]
    fn rejects_zero_key() {
        let zero = format!("0x{}", "0".repeat(64));
        assert!(matches!(sender_address(&zero), Err(DeployError::InvalidKey(_))));
    }
}
