//! Cancellable proof-of-work nonce search.

use log::info;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::proof_of_work::leading_zero_bits;
use crate::core::{Block, Chain, Transaction};
use crate::error::{ChainError, Result};
use crate::utils::{current_timestamp, to_hex};

/// Progress observer: `(attempts so far, leading zero bits of the last
/// hash, hex of the last hash)`. Invoked from the mining worker; must be
/// non-blocking and must not call back into the chain.
pub type MinerProgress<'a> = &'a mut dyn FnMut(u64, u32, &str);

/// Searches nonces for a block on top of `chain`'s tip until one meets
/// `difficulty_bits`, the timestamp starting at the current wall-clock
/// second and bumped forward every million nonces. The chain itself is
/// never touched; only a snapshot of its tip hash is read up front.
///
/// `tick_every_ms` counts *attempts* between progress callbacks, not
/// milliseconds; the name is historical.
///
/// The cancel flag is polled once per nonce; when it becomes true the
/// search fails with [`ChainError::Cancelled`].
pub fn mine_block(
    chain: &Chain,
    transactions: Vec<Transaction>,
    difficulty_bits: u32,
    cancel_flag: &AtomicBool,
    mut on_progress: Option<MinerProgress<'_>>,
    tick_every_ms: u64,
) -> Result<Block> {
    let now = current_timestamp()?;
    let mut block = chain.build_block_from_transactions(transactions, now);

    info!(
        "mining at {difficulty_bits} bits on top of height {}",
        chain.height()
    );

    let mut attempts: u64 = 0;
    let mut last_timestamp_bump: u64 = 0;
    let mut nonce: u64 = 0;

    while !cancel_flag.load(Ordering::Relaxed) {
        block.header.nonce = nonce;
        let hash = block.header.hash();
        let leading_zeros = leading_zero_bits(&hash);

        if leading_zeros >= difficulty_bits {
            info!(
                "mined block after {attempts} attempts ({}…)",
                &to_hex(&hash)[..16]
            );
            return Ok(block);
        }

        attempts += 1;
        if let Some(callback) = on_progress.as_mut() {
            if tick_every_ms > 0 && attempts % tick_every_ms == 0 {
                callback(attempts, leading_zeros, &to_hex(&hash));
            }
        }

        // Keep the candidate timestamp close to the wall clock during long
        // searches; bumping it changes the header preimage.
        if nonce % 1_000_000 == 0 {
            if let Ok(fresh) = current_timestamp() {
                if fresh > last_timestamp_bump {
                    block.header.timestamp = fresh;
                    last_timestamp_bump = fresh;
                }
            }
        }

        nonce += 1;
    }

    Err(ChainError::Cancelled)
}
