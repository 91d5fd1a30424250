use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use crate::{
    asset::AssetHandle,
    error::{Result, ZapError},
    require,
    runtime::{CallContext, Runtime},
};

/// Result of one conversion, both sides measured on the holder's balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    pub amount_out: u64,
    /// Input the venue was offered but did not take; still held by the holder.
    pub unspent: u64,
}

/// Drives one conversion through an external swap venue on behalf of `holder`.
#[derive(Debug, Clone, Copy)]
pub struct AggregatorAdapter {
    holder: Pubkey,
}

impl AggregatorAdapter {
    pub fn new(holder: Pubkey) -> Self {
        Self { holder }
    }

    /// Native ↔ wrapped-native converts 1:1 without a venue.
    pub fn is_wrap_pair(rt: &Runtime, asset_in: &Pubkey, asset_out: &Pubkey) -> bool {
        let wrapped = rt.wrapped_native();
        let (input, output) = (AssetHandle::new(*asset_in), AssetHandle::new(*asset_out));
        (input.is_native() && *asset_out == wrapped) || (*asset_in == wrapped && output.is_native())
    }

    /// Convert up to `amount_in` of `asset_in` into `asset_out`.
    ///
    /// A venue may fill only part of the order. Whatever input it leaves
    /// behind is reported as [`Fill::unspent`] for the caller to settle.
    pub fn swap(
        &self,
        rt: &mut Runtime,
        asset_in: &Pubkey,
        amount_in: u64,
        asset_out: &Pubkey,
        venue: &Pubkey,
        call_data: &[u8],
    ) -> Result<Fill> {
        require!(amount_in > 0, ZapError::ZeroAmount);

        if Self::is_wrap_pair(rt, asset_in, asset_out) {
            let wrapped = rt.wrapped_native();
            if AssetHandle::new(*asset_in).is_native() {
                rt.bank_mut().wrap(&wrapped, &self.holder, amount_in)?;
            } else {
                rt.bank_mut().unwrap(&wrapped, &self.holder, amount_in)?;
            }
            debug!(holder = %self.holder, amount_in, "wrap shortcut");
            return Ok(Fill {
                amount_out: amount_in,
                unspent: 0,
            });
        }

        let input = AssetHandle::new(*asset_in);
        let output = AssetHandle::new(*asset_out);
        let before = output.balance_of(rt.bank(), &self.holder);
        let in_before = input.balance_of(rt.bank(), &self.holder);

        let value = input.authorize(rt.bank_mut(), &self.holder, venue, amount_in);
        let call = CallContext::signed(self.holder).with_value(value);
        let reported = rt
            .call_swap_venue(venue, call, call_data)
            .map_err(|e| match e {
                ZapError::ReentrantCall
                | ZapError::SlippageExceeded { .. }
                | ZapError::UnknownVenue(_) => e,
                other => ZapError::SwapExecutionFailed(other.to_string()),
            })?;
        input.revoke(rt.bank_mut(), &self.holder, venue);

        let after = output.balance_of(rt.bank(), &self.holder);
        let received = after.saturating_sub(before);
        let spent = in_before.saturating_sub(input.balance_of(rt.bank(), &self.holder));
        let unspent = amount_in.saturating_sub(spent);
        if reported != received {
            warn!(
                %venue,
                reported,
                received,
                "swap venue misreported its output"
            );
        }
        require!(received > 0, ZapError::ZeroOutput);

        debug!(%venue, amount_in, received, unspent, "swap complete");
        Ok(Fill {
            amount_out: received,
            unspent,
        })
    }
}
