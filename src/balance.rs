use rand::{rngs::StdRng, Rng, SeedableRng};

pub const DEFAULT_BALANCE: i32 = 10;
pub const RANDOM_BALANCE_MIN: i32 = 1;
pub const RANDOM_BALANCE_MAX: i32 = 9_999;

/// How record balances are drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceMode {
    Constant(i32),
    /// Uniform over `min..=max`.
    Random { min: i32, max: i32 },
}

impl BalanceMode {
    pub fn random() -> Self {
        BalanceMode::Random {
            min: RANDOM_BALANCE_MIN,
            max: RANDOM_BALANCE_MAX,
        }
    }
}

impl Default for BalanceMode {
    fn default() -> Self {
        BalanceMode::Constant(DEFAULT_BALANCE)
    }
}

pub struct BalanceSource {
    mode: BalanceMode,
    rng: StdRng,
}

impl BalanceSource {
    pub fn new(mode: BalanceMode, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { mode, rng }
    }

    pub fn mode(&self) -> BalanceMode {
        self.mode
    }

    pub fn next_balance(&mut self) -> i32 {
        match self.mode {
            BalanceMode::Constant(value) => value,
            BalanceMode::Random { min, max } if min >= max => min,
            BalanceMode::Random { min, max } => self.rng.gen_range(min..=max),
        }
    }
}
