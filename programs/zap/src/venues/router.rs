//! Reference swap venue: fills a single JSON-encoded order against the
//! constant-product pools of one pool venue.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::{
    asset::AssetHandle,
    error::{Result, ZapError},
    require,
    runtime::{CallContext, Runtime},
    serde_b58,
    venues::{ConstantProductVenue, SwapVenue},
};

/// Call data understood by [`OrderRouter`].
///
/// Native legs are routed through the wrapped-native pool; the router wraps
/// and unwraps on the caller's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOrder {
    #[serde(with = "serde_b58")]
    pub asset_in: Pubkey,
    #[serde(with = "serde_b58")]
    pub asset_out: Pubkey,
    pub amount_in: u64,
    pub min_amount_out: u64,
    #[serde(with = "serde_b58")]
    pub recipient: Pubkey,
}

impl SwapOrder {
    pub fn new(asset_in: Pubkey, asset_out: Pubkey, amount_in: u64, recipient: Pubkey) -> Self {
        Self {
            asset_in,
            asset_out,
            amount_in,
            min_amount_out: 0,
            recipient,
        }
    }

    pub fn with_min_out(mut self, min_amount_out: u64) -> Self {
        self.min_amount_out = min_amount_out;
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        // a struct of strings and integers always serializes
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn decode(call_data: &[u8]) -> Result<Self> {
        serde_json::from_slice(call_data).map_err(|e| ZapError::InvalidCallData(e.to_string()))
    }
}

pub struct OrderRouter {
    address: Pubkey,
    pools: Rc<ConstantProductVenue>,
}

impl OrderRouter {
    pub fn new(address: Pubkey, pools: Rc<ConstantProductVenue>) -> Self {
        Self { address, pools }
    }

    /// Expected output of `order` at current reserves.
    pub fn quote(&self, rt: &Runtime, order: &SwapOrder) -> Result<u64> {
        let wrapped = rt.wrapped_native();
        let mint_in = route_mint(order.asset_in, wrapped);
        let mint_out = route_mint(order.asset_out, wrapped);
        let (_, amount_out) = self
            .pools
            .quote_swap(rt.bank(), &mint_in, order.amount_in, &mint_out)?;
        Ok(amount_out)
    }
}

impl SwapVenue for OrderRouter {
    fn address(&self) -> Pubkey {
        self.address
    }

    fn execute(&self, rt: &mut Runtime, ctx: &CallContext, call_data: &[u8]) -> Result<u64> {
        let order = SwapOrder::decode(call_data)?;
        require!(order.amount_in > 0, ZapError::ZeroAmount);

        let wrapped = rt.wrapped_native();
        let asset_in = AssetHandle::new(order.asset_in);
        let asset_out = AssetHandle::new(order.asset_out);
        let mint_in = route_mint(order.asset_in, wrapped);
        let mint_out = route_mint(order.asset_out, wrapped);

        // ── Take the input ────────────────────────────────────────────────────
        match asset_in {
            AssetHandle::Native => {
                require!(
                    ctx.value == order.amount_in,
                    ZapError::ValueMismatch {
                        expected: order.amount_in,
                        attached: ctx.value,
                    }
                );
                rt.bank_mut().wrap(&wrapped, &self.address, order.amount_in)?;
            }
            AssetHandle::Token(mint) => {
                require!(
                    ctx.value == 0,
                    ZapError::ValueMismatch {
                        expected: 0,
                        attached: ctx.value,
                    }
                );
                rt.bank_mut()
                    .transfer_from(&mint, &self.address, &ctx.caller, &self.address, order.amount_in)?;
            }
        }

        // ── Fill and deliver ──────────────────────────────────────────────────
        let pay_to = if asset_out.is_native() {
            self.address
        } else {
            order.recipient
        };
        let amount_out = self.pools.fill(
            rt.bank_mut(),
            &self.address,
            &mint_in,
            order.amount_in,
            &mint_out,
            order.min_amount_out,
            &pay_to,
        )?;
        if asset_out.is_native() {
            rt.bank_mut().unwrap(&wrapped, &self.address, amount_out)?;
            rt.bank_mut()
                .transfer_native(&self.address, &order.recipient, amount_out)?;
        }

        debug!(
            router = %self.address,
            amount_in = order.amount_in,
            amount_out,
            "order filled"
        );
        Ok(amount_out)
    }
}

fn route_mint(asset: Pubkey, wrapped: Pubkey) -> Pubkey {
    match AssetHandle::new(asset) {
        AssetHandle::Native => wrapped,
        AssetHandle::Token(mint) => mint,
    }
}
