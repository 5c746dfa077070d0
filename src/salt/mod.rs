// Salt allocation
//
// Many instances of the same code are deployed by one creator by suffixing a
// base salt with an index: `base`, `base-0001`, `base-0002`, ... The scans
// below walk that sequence against the chain to find the next free slot or to
// rediscover what was deployed earlier.

use std::collections::BTreeSet;

use common::{Address, AddressError, Checksum, DeployError, Salt};
use log::{debug, info};
use serde::Serialize;

use crate::address::AddressPredictor;
use crate::oracle::ExistenceOracle;

/// Width of the zero padded index suffix
pub const INDEX_WIDTH: usize = 4;

/// Separator between the base salt and the index
const INDEX_SEPARATOR: char = '-';

/// Salt for an index: the base itself for 0, `base-0001` style otherwise
pub fn format_salt(base: &str, index: u32) -> Result<Salt, AddressError> {
    if index == 0 {
        return Salt::new(base);
    }
    Salt::new(format!(
        "{base}{INDEX_SEPARATOR}{index:0width$}",
        width = INDEX_WIDTH
    ))
}

/// Recover the index encoded in a salt
///
/// Accepts the padded form and the legacy unpadded form (`base-7`). Returns
/// `None` for anything else instead of guessing.
pub fn parse_index(salt: &str, base: &str) -> Option<u32> {
    if salt == base {
        return Some(0);
    }

    let suffix = salt.strip_prefix(base)?.strip_prefix(INDEX_SEPARATOR)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let index: u32 = suffix.parse().ok()?;
    if index == 0 {
        return None;
    }

    let padded = format!("{index:0width$}", width = INDEX_WIDTH);
    if suffix == padded || !suffix.starts_with('0') {
        Some(index)
    } else {
        None
    }
}

/// Like [`parse_index`] but reports unclassifiable salts as an error
pub fn parse_index_strict(salt: &str, base: &str) -> Result<u32, DeployError> {
    parse_index(salt, base).ok_or_else(|| DeployError::AmbiguousSaltFormat {
        salt: salt.to_string(),
        base: base.to_string(),
    })
}

/// A contract found on chain by probing a salt index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentRecord {
    pub address: Address,
    pub salt: Salt,
    pub index: u32,
    pub exists: bool,
}

/// A salt slot claimed for a new or future contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub index: u32,
    pub salt: Salt,
    pub address: Address,
}

/// Indices claimed during one planning call
///
/// The chain does not know about contracts that are only planned, so every
/// allocation made in a batch is tracked here and skipped by later scans.
#[derive(Debug, Clone, Default)]
pub struct SaltReservations {
    reserved: BTreeSet<u32>,
}

impl SaltReservations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the index was already reserved
    pub fn reserve(&mut self, index: u32) -> bool {
        self.reserved.insert(index)
    }

    pub fn is_reserved(&self, index: u32) -> bool {
        self.reserved.contains(&index)
    }

    pub fn highest(&self) -> Option<u32> {
        self.reserved.iter().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.reserved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reserved.is_empty()
    }
}

/// The salt sequence of one (creator, code, base salt) triple
pub struct SaltScan<'a> {
    predictor: &'a AddressPredictor,
    creator: &'a Address,
    checksum: &'a Checksum,
    base: &'a str,
}

impl<'a> SaltScan<'a> {
    pub fn new(
        predictor: &'a AddressPredictor,
        creator: &'a Address,
        checksum: &'a Checksum,
        base: &'a str,
    ) -> Self {
        Self {
            predictor,
            creator,
            checksum,
            base,
        }
    }

    pub fn base(&self) -> &str {
        self.base
    }

    /// Salt and predicted address of a slot
    pub fn slot(&self, index: u32) -> Result<(Salt, Address), AddressError> {
        let salt = format_salt(self.base, index)?;
        let address = self.predictor.predict(self.creator, self.checksum, &salt)?;
        Ok((salt, address))
    }

    /// Find the first index with no contract on chain and no reservation
    ///
    /// Scans contiguously from 0. Reserved indices are skipped without a
    /// query. `max_probes` bounds the number of oracle queries.
    pub async fn allocate_next<O: ExistenceOracle + ?Sized>(
        &self,
        oracle: &O,
        reservations: &mut SaltReservations,
        max_probes: Option<u32>,
    ) -> Result<Allocation, DeployError> {
        let mut index: u32 = 0;
        let mut probed: u32 = 0;

        loop {
            if !reservations.is_reserved(index) {
                if max_probes.map_or(false, |limit| probed >= limit) {
                    return Err(self.exhausted(probed));
                }

                let (salt, address) = self.slot(index)?;
                probed += 1;
                if !oracle.exists(&address).await? {
                    reservations.reserve(index);
                    info!("allocated salt `{}` (index {}) -> {}", salt, index, address);
                    return Ok(Allocation {
                        index,
                        salt,
                        address,
                    });
                }
                debug!("salt index {} of `{}` is taken by {}", index, self.base, address);
            }

            index = index.checked_add(1).ok_or_else(|| self.exhausted(probed))?;
        }
    }

    /// List deployments at indices `0..max`, stopping at the first gap
    pub async fn enumerate_existing<O: ExistenceOracle + ?Sized>(
        &self,
        oracle: &O,
        max: u32,
    ) -> Result<Vec<DeploymentRecord>, DeployError> {
        let mut records = Vec::new();

        for index in 0..max {
            let (salt, address) = self.slot(index)?;
            if !oracle.exists(&address).await? {
                debug!("salt index {} of `{}` is empty, stopping", index, self.base);
                break;
            }
            records.push(DeploymentRecord {
                address,
                salt,
                index,
                exists: true,
            });
        }

        info!("found {} existing deployments for `{}`", records.len(), self.base);
        Ok(records)
    }

    /// Reserve `count` slots for contracts that will be deployed later
    ///
    /// Slots start at `start` or after the highest reservation, whichever is
    /// later. Reserved indices are skipped without a query; indices already
    /// deployed past an enumeration gap are skipped after one.
    pub async fn reserve_future<O: ExistenceOracle + ?Sized>(
        &self,
        oracle: &O,
        reservations: &mut SaltReservations,
        start: u32,
        count: usize,
    ) -> Result<Vec<Allocation>, DeployError> {
        let mut index = match reservations.highest() {
            Some(highest) => start.max(highest.saturating_add(1)),
            None => start,
        };
        let mut slots = Vec::with_capacity(count);

        while slots.len() < count {
            if !reservations.is_reserved(index) {
                let (salt, address) = self.slot(index)?;
                if oracle.exists(&address).await? {
                    debug!("future slot {} of `{}` is taken by {}", index, self.base, address);
                } else {
                    reservations.reserve(index);
                    slots.push(Allocation {
                        index,
                        salt,
                        address,
                    });
                }
            }
            index = index
                .checked_add(1)
                .ok_or_else(|| self.exhausted(slots.len() as u32))?;
        }

        Ok(slots)
    }

    fn exhausted(&self, probed: u32) -> DeployError {
        DeployError::NoFreeSaltFound {
            base: self.base.to_string(),
            probed,
        }
    }
}

/// Next free salt for a creator and code, scanning from index 0
pub async fn allocate_next<O: ExistenceOracle + ?Sized>(
    predictor: &AddressPredictor,
    base: &str,
    creator: &Address,
    checksum: &Checksum,
    oracle: &O,
) -> Result<(Salt, u32), DeployError> {
    let scan = SaltScan::new(predictor, creator, checksum, base);
    let mut reservations = SaltReservations::new();
    let allocation = scan.allocate_next(oracle, &mut reservations, None).await?;
    Ok((allocation.salt, allocation.index))
}

/// Existing deployments at indices `0..max`, stopping at the first gap
pub async fn enumerate_existing<O: ExistenceOracle + ?Sized>(
    predictor: &AddressPredictor,
    base: &str,
    creator: &Address,
    checksum: &Checksum,
    oracle: &O,
    max: u32,
) -> Result<Vec<DeploymentRecord>, DeployError> {
    SaltScan::new(predictor, creator, checksum, base)
        .enumerate_existing(oracle, max)
        .await
}
