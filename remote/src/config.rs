use serde::{Serialize, Deserialize};
use servocmd::DEFAULT_PORT;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub target_host: String,   // Controller address
    pub target_port: u16,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            target_host: String::from("192.168.1.5"),
            target_port: DEFAULT_PORT,
        }
    }
}

impl RemoteConfig {
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        
        let mut file = fs::File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
    
    pub fn load(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        let loaded: RemoteConfig = serde_json::from_str(&content)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(loaded)
    }
}
