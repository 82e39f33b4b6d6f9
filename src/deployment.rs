use chrono::Utc;
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use serde::{
    Deserialize,
    Serialize,
};
use sha2::{
    Digest,
    Sha256,
};
use std::{
    fmt,
    fs,
    io::Write,
    path::{
        Path,
        PathBuf,
    },
};

pub const DEPLOYMENTS_ROOT: &str = ".deployments";
const DEPLOYMENTS_FILE: &str = "deployments.json";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeploymentEnv {
    Test,
    Local,
}

impl DeploymentEnv {
    pub fn dir_name(self) -> &'static str {
        match self {
            DeploymentEnv::Test => "test",
            DeploymentEnv::Local => "local",
        }
    }
}

impl fmt::Display for DeploymentEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentEnv::Test => "Testnet",
            DeploymentEnv::Local => "Local",
        };
        write!(f, "{name}")
    }
}

/// One known address of the arena contract on a network.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub recorded_at: String,
    pub contract_address: String,
    pub abi_hash: String,
    pub network_url: String,
    #[serde(default)]
    pub chain_id: Option<u64>,
}

impl DeploymentRecord {
    pub fn new(
        contract_address: impl Into<String>,
        abi_hash: impl Into<String>,
        network_url: impl Into<String>,
        chain_id: Option<u64>,
    ) -> Self {
        Self {
            recorded_at: Utc::now().to_rfc3339(),
            contract_address: contract_address.into(),
            abi_hash: abi_hash.into(),
            network_url: network_url.into(),
            chain_id,
        }
    }

    pub fn is_compatible_with_hash(&self, hash: &str) -> bool {
        self.abi_hash == hash
    }
}

#[derive(Debug)]
pub struct DeploymentStore {
    path: PathBuf,
}

impl DeploymentStore {
    pub fn new(env: DeploymentEnv) -> Result<Self> {
        Self::at(DEPLOYMENTS_ROOT, env)
    }

    /// Store rooted somewhere other than the working directory.
    pub fn at(root: impl AsRef<Path>, env: DeploymentEnv) -> Result<Self> {
        let path = ensure_store(root.as_ref(), env)?;
        Ok(Self { path })
    }

    pub fn load(&self) -> Result<Vec<DeploymentRecord>> {
        read_records(&self.path)
    }

    pub fn latest(&self) -> Result<Option<DeploymentRecord>> {
        Ok(self.load()?.pop())
    }

    pub fn append(&self, record: DeploymentRecord) -> Result<()> {
        let mut records = self.load()?;
        records.push(record);
        write_records(&self.path, &records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn compute_abi_hash(abi: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(abi);
    hex::encode(hasher.finalize())
}

pub fn ensure_structure() -> Result<()> {
    for env in [DeploymentEnv::Test, DeploymentEnv::Local] {
        let _ = ensure_store(Path::new(DEPLOYMENTS_ROOT), env)?;
    }
    Ok(())
}

fn ensure_store(root: &Path, env: DeploymentEnv) -> Result<PathBuf> {
    let env_dir = root.join(env.dir_name());
    if !env_dir.exists() {
        fs::create_dir_all(&env_dir).wrap_err_with(|| {
            format!("Failed to create deployments directory {}", env_dir.display())
        })?;
    }

    let file_path = env_dir.join(DEPLOYMENTS_FILE);
    if !file_path.exists() {
        let mut file = fs::File::create(&file_path).wrap_err_with(|| {
            format!(
                "Failed to create deployment record file for {} at {:?}",
                env, file_path
            )
        })?;
        file.write_all(b"[]").wrap_err_with(|| {
            format!("Failed to initialize deployment record file for {}", env)
        })?;
    }

    Ok(file_path)
}

fn read_records(path: impl AsRef<Path>) -> Result<Vec<DeploymentRecord>> {
    let data = fs::read(path.as_ref()).wrap_err("Failed to read deployment records")?;
    if data.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_slice::<Vec<DeploymentRecord>>(&data)
        .wrap_err("Failed to parse deployment records JSON")
}

fn write_records(path: impl AsRef<Path>, records: &[DeploymentRecord]) -> Result<()> {
    let json = serde_json::to_vec_pretty(records)
        .wrap_err("Failed to serialize deployment records")?;
    fs::write(path.as_ref(), json).wrap_err("Failed to write deployment records")
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn at__creates_empty_store() {
        // given
        let dir = TempDir::new("deployments").unwrap();

        // when
        let store = DeploymentStore::at(dir.path(), DeploymentEnv::Local).unwrap();

        // then
        assert!(store.path().ends_with("local/deployments.json"));
        assert!(store.load().unwrap().is_empty());
        assert_eq!(store.latest().unwrap(), None);
    }

    #[test]
    fn latest__returns_last_appended_record() {
        // given
        let dir = TempDir::new("deployments").unwrap();
        let store = DeploymentStore::at(dir.path(), DeploymentEnv::Test).unwrap();
        let first = DeploymentRecord::new("0x01", "aa", "http://a", Some(31));
        let second = DeploymentRecord::new("0x02", "bb", "http://a", Some(31));

        // when
        store.append(first).unwrap();
        store.append(second.clone()).unwrap();

        // then
        assert_eq!(store.load().unwrap().len(), 2);
        assert_eq!(store.latest().unwrap(), Some(second));
    }

    #[test]
    fn compute_abi_hash__is_stable_hex() {
        let hash = compute_abi_hash(b"[]");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, compute_abi_hash(b"[]"));
        assert_ne!(hash, compute_abi_hash(b"[{}]"));
    }
}
