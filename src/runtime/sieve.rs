//! Lazily grown prime table owned by an interpreter.

/// Largest limit the table grows to; primality above it uses Miller-Rabin.
const SIEVE_CAP: u64 = 1 << 24;
const INITIAL_LIMIT: u64 = 1000;

#[derive(Clone, Debug, Default)]
pub struct PrimeSieve {
    composite: Vec<bool>,
    primes: Vec<u64>,
}

impl PrimeSieve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit (exclusive) the table currently covers.
    pub fn sieved(&self) -> u64 {
        self.composite.len() as u64
    }

    /// Makes every number below `limit` classified, doubling at least to
    /// amortise repeated growth.
    pub fn ensure_sieved_to(&mut self, limit: u64) {
        let limit = limit.min(SIEVE_CAP);
        if limit <= self.sieved() {
            return;
        }
        let limit = limit.max(self.sieved() * 2).max(INITIAL_LIMIT).min(SIEVE_CAP) as usize;
        let mut composite = vec![false; limit];
        let mut primes = Vec::new();
        for n in 2..limit {
            if composite[n] {
                continue;
            }
            primes.push(n as u64);
            let mut multiple = n * n;
            while multiple < limit {
                composite[multiple] = true;
                multiple += n;
            }
        }
        self.composite = composite;
        self.primes = primes;
    }

    pub fn is_prime(&mut self, n: u64) -> bool {
        if n < 2 {
            return false;
        }
        if n < SIEVE_CAP {
            self.ensure_sieved_to(n + 1);
            return !self.composite[n as usize];
        }
        miller_rabin(n)
    }

    pub fn primes_below(&mut self, n: u64) -> Vec<u64> {
        if n <= SIEVE_CAP {
            self.ensure_sieved_to(n);
            return self.primes.iter().copied().take_while(|p| *p < n).collect();
        }
        self.ensure_sieved_to(SIEVE_CAP);
        let mut primes = self.primes.clone();
        primes.extend((SIEVE_CAP..n).filter(|candidate| miller_rabin(*candidate)));
        primes
    }

    /// Prime factors in ascending order, repeated by multiplicity.
    pub fn factorize(&mut self, mut n: u64) -> Vec<u64> {
        let mut factors = Vec::new();
        if n < 2 {
            return factors;
        }
        let root = integer_sqrt(n);
        self.ensure_sieved_to(root + 1);
        let mut trial_from = 2;
        for &p in &self.primes {
            if p * p > n {
                break;
            }
            while n % p == 0 {
                factors.push(p);
                n /= p;
            }
            trial_from = p + 1;
        }
        let mut d = trial_from.max(2);
        while d.saturating_mul(d) <= n {
            while n % d == 0 {
                factors.push(d);
                n /= d;
            }
            d += 1;
        }
        if n > 1 {
            factors.push(n);
        }
        factors
    }

    /// Euler's totient, from the distinct prime factors.
    pub fn totient(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        let mut factors = self.factorize(n);
        factors.dedup();
        factors.iter().fold(n, |acc, p| acc / p * (p - 1))
    }
}

fn integer_sqrt(n: u64) -> u64 {
    let mut root = (n as f64).sqrt() as u64;
    while root.saturating_mul(root) > n {
        root -= 1;
    }
    while (root + 1).saturating_mul(root + 1) <= n {
        root += 1;
    }
    root
}

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut result = 1 % m;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    result
}

/// Deterministic for every 64-bit input with these witnesses.
fn miller_rabin(n: u64) -> bool {
    const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
    if n < 2 {
        return false;
    }
    for p in WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }
    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }
    'witness: for a in WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
