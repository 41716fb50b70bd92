//! Commit-reveal randomness for provably fair boards.
//!
//! The engine draws a secret server seed and publishes only its SHA-256
//! hash. The player then picks a client seed. The board digest is
//! `SHA-256(server_seed || client_seed || nonce_be)`, and once the game is
//! over the server seed is disclosed so anyone can recompute the digest,
//! check it against the published hash and rebuild the mine layout.

use crate::common::traits::SeedSource;
use crate::errors::GameError;
use crate::games::board;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

pub const SERVER_SEED_LEN: usize = 32;

/// Engine-held secret seed; never leaves the engine before its game ends
#[derive(Clone, PartialEq, Eq)]
pub struct ServerSeed([u8; SERVER_SEED_LEN]);

impl ServerSeed {
    /// Draw a fresh seed from the operating system RNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; SERVER_SEED_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SERVER_SEED_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(input: &str) -> Result<Self, FairnessError> {
        let bytes = hex::decode(input.trim()).map_err(|e| FairnessError::InvalidHex(e.to_string()))?;
        let bytes: [u8; SERVER_SEED_LEN] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| FairnessError::InvalidSeedLength(v.len()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SERVER_SEED_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Public commitment: hex SHA-256 of the seed
    pub fn hash_hex(&self) -> String {
        hex::encode(Sha256::digest(self.0))
    }
}

impl fmt::Debug for ServerSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerSeed(<redacted>)")
    }
}

/// What a player sees before choosing a client seed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedCommitment {
    pub server_seed_hash: String,
    pub nonce: u64,
}

/// Committed-but-unrevealed server seed bound to the nonce it will serve
#[derive(Clone, Debug)]
pub struct PendingCommitment {
    server_seed: ServerSeed,
    commitment: SeedCommitment,
}

impl PendingCommitment {
    /// Phase one: draw a seed and publish its hash
    pub fn commit(seeds: &dyn SeedSource, nonce: u64) -> Self {
        Self::with_seed(seeds.server_seed(), nonce)
    }

    pub fn with_seed(server_seed: ServerSeed, nonce: u64) -> Self {
        let commitment = SeedCommitment {
            server_seed_hash: server_seed.hash_hex(),
            nonce,
        };
        Self {
            server_seed,
            commitment,
        }
    }

    pub fn commitment(&self) -> &SeedCommitment {
        &self.commitment
    }

    pub fn nonce(&self) -> u64 {
        self.commitment.nonce
    }

    /// Bind the player's seed; the resulting pair fixes the board
    pub fn bind(self, client_seed: Vec<u8>) -> SeedPair {
        SeedPair {
            server_seed: self.server_seed,
            client_seed,
            nonce: self.commitment.nonce,
        }
    }
}

/// Full entropy input of one game
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedPair {
    pub server_seed: ServerSeed,
    pub client_seed: Vec<u8>,
    pub nonce: u64,
}

impl SeedPair {
    pub fn digest(&self) -> [u8; 32] {
        game_digest(&self.server_seed, &self.client_seed, self.nonce)
    }

    pub fn commitment(&self) -> SeedCommitment {
        SeedCommitment {
            server_seed_hash: self.server_seed.hash_hex(),
            nonce: self.nonce,
        }
    }
}

/// `SHA-256(server_seed || client_seed || nonce as 8-byte big-endian)`
pub fn game_digest(server_seed: &ServerSeed, client_seed: &[u8], nonce: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(server_seed.as_bytes());
    hasher.update(client_seed);
    hasher.update(nonce.to_be_bytes());
    hasher.finalize().into()
}

/// Reject empty or oversized client seeds
pub fn validate_client_seed(client_seed: &[u8], max_len: usize) -> Result<(), GameError> {
    if client_seed.is_empty() {
        return Err(GameError::InvalidSeed {
            length: 0,
            reason: "client seed must not be empty".to_string(),
        });
    }
    if client_seed.len() > max_len {
        return Err(GameError::InvalidSeed {
            length: client_seed.len(),
            reason: format!("client seed must be at most {} bytes", max_len),
        });
    }
    Ok(())
}

/// Inputs a third party needs to re-derive a finished board
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub server_seed: String,
    pub client_seed: Vec<u8>,
    pub nonce: u64,
    pub tile_count: u32,
    pub mine_count: u32,
    /// Hash published before the game; checked when present
    #[serde(default)]
    pub expected_server_seed_hash: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub server_seed_hash: String,
    /// `None` when no expected hash was supplied
    pub commitment_matches: Option<bool>,
    pub digest: String,
    pub mine_positions: Vec<u32>,
}

/// Recompute the commitment and mine layout from revealed seeds
pub fn verify_game(request: &VerificationRequest) -> Result<VerificationReport, FairnessError> {
    let server_seed = ServerSeed::from_hex(&request.server_seed)?;
    let server_seed_hash = server_seed.hash_hex();
    let commitment_matches = request
        .expected_server_seed_hash
        .as_ref()
        .map(|expected| expected.trim().eq_ignore_ascii_case(&server_seed_hash));

    let digest = game_digest(&server_seed, &request.client_seed, request.nonce);
    let mines = board::generate_mine_positions(&digest, request.tile_count, request.mine_count)?;

    Ok(VerificationReport {
        server_seed_hash,
        commitment_matches,
        digest: hex::encode(digest),
        mine_positions: mines.into_iter().collect(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FairnessError {
    #[error("Invalid server seed hex: {0}")]
    InvalidHex(String),

    #[error("Server seed must be 32 bytes, got {0}")]
    InvalidSeedLength(usize),

    #[error(transparent)]
    Board(#[from] GameError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_seed() -> ServerSeed {
        ServerSeed::from_bytes([7u8; SERVER_SEED_LEN])
    }

    #[test]
    fn test_commitment_is_hash_of_seed() {
        let pending = PendingCommitment::with_seed(fixed_seed(), 3);
        assert_eq!(pending.commitment().server_seed_hash, fixed_seed().hash_hex());
        assert_eq!(pending.nonce(), 3);
        assert_eq!(pending.commitment().server_seed_hash.len(), 64);
    }

    #[test]
    fn test_generated_seeds_differ() {
        let a = ServerSeed::generate();
        let b = ServerSeed::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_depends_on_every_input() {
        let base = game_digest(&fixed_seed(), b"client", 1);
        assert_eq!(base, game_digest(&fixed_seed(), b"client", 1));
        assert_ne!(base, game_digest(&fixed_seed(), b"client", 2));
        assert_ne!(base, game_digest(&fixed_seed(), b"other", 1));
        assert_ne!(base, game_digest(&ServerSeed::from_bytes([8u8; 32]), b"client", 1));
    }

    #[test]
    fn test_bind_keeps_nonce() {
        let pair = PendingCommitment::with_seed(fixed_seed(), 9).bind(b"abc".to_vec());
        assert_eq!(pair.nonce, 9);
        assert_eq!(pair.digest(), game_digest(&fixed_seed(), b"abc", 9));
        assert_eq!(pair.commitment().server_seed_hash, fixed_seed().hash_hex());
    }

    #[test]
    fn test_client_seed_validation() {
        assert!(validate_client_seed(b"", 64).is_err());
        assert!(validate_client_seed(&[1u8; 65], 64).is_err());
        assert!(validate_client_seed(&[1u8; 64], 64).is_ok());
    }

    #[test]
    fn test_hex_round_trip_and_errors() {
        let seed = fixed_seed();
        assert_eq!(ServerSeed::from_hex(&seed.to_hex()), Ok(seed));
        assert!(matches!(ServerSeed::from_hex("zz"), Err(FairnessError::InvalidHex(_))));
        assert_eq!(ServerSeed::from_hex("abcd"), Err(FairnessError::InvalidSeedLength(2)));
    }

    #[test]
    fn test_debug_redacts_seed() {
        assert!(!format!("{:?}", fixed_seed()).contains("07"));
    }

    #[test]
    fn test_verify_game_checks_commitment() {
        let seed = fixed_seed();
        let request = VerificationRequest {
            server_seed: seed.to_hex(),
            client_seed: b"client".to_vec(),
            nonce: 1,
            tile_count: 25,
            mine_count: 5,
            expected_server_seed_hash: Some(seed.hash_hex().to_uppercase()),
        };

        let report = verify_game(&request).unwrap();
        assert_eq!(report.commitment_matches, Some(true));
        assert_eq!(report.mine_positions.len(), 5);

        let tampered = VerificationRequest {
            expected_server_seed_hash: Some("00".repeat(32)),
            ..request
        };
        assert_eq!(verify_game(&tampered).unwrap().commitment_matches, Some(false));
    }

    #[test]
    fn test_verify_game_rejects_bad_board() {
        let request = VerificationRequest {
            server_seed: fixed_seed().to_hex(),
            client_seed: b"client".to_vec(),
            nonce: 1,
            tile_count: 24,
            mine_count: 5,
            expected_server_seed_hash: None,
        };
        assert!(matches!(verify_game(&request), Err(FairnessError::Board(_))));
    }
}
