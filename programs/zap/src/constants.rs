use solana_sdk::pubkey::Pubkey;

/// Reserved id for the native base asset (0xEE repeated, after the EVM `0xEeee…` convention).
pub const NATIVE_ASSET: Pubkey = Pubkey::new_from_array([0xEE; 32]);

/// Wrapped-native mint the host uses unless told otherwise.
pub const DEFAULT_WRAPPED_NATIVE: Pubkey =
    solana_sdk::pubkey!("So11111111111111111111111111111111111111112");

/// The "nobody" identity: an affiliate left unset.
pub const UNSET_AFFILIATE: Pubkey = Pubkey::new_from_array([0; 32]);

/// Denominator for basis-point math (u128 to avoid up-cast noise)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Goodwill is capped at 1 %.
pub const MAX_GOODWILL_BPS: u16 = 100;

/// Affiliate split may route at most the whole goodwill.
pub const MAX_AFFILIATE_SPLIT_BPS: u16 = 10_000;
