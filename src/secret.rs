use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

#[inline(always)]
pub fn sha256<T>(input: T) -> String
where
    T: AsRef<[u8]>,
{
    let hash = Sha256::digest(input);
    format!("{hash:x}")
}

/// One-way password hash: sha256 over the password concatenated with a
/// per-user random salt.
pub fn hash_password(password: &str, salt: &str) -> String {
    sha256(format!("{password}{salt}"))
}

pub fn verify_password(password: &str, salt: &str, hash: &str) -> bool {
    hash_password(password, salt) == hash
}

pub fn generate_salt(length: usize) -> String {
    let mut rng = thread_rng();

    (0..length)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect()
}
