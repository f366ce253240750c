pub mod clamav;

use std::sync::Arc;

use anyhow::Result;
use intake_core::{IntakeConfig, ScanBackend};
use intake_processing::VirusScanner;

/// Build the configured scanner, or `None` when scanning is disabled.
pub fn scanner_from_config(config: &IntakeConfig) -> Result<Option<Arc<dyn VirusScanner>>> {
    if !config.virus_scan_enabled {
        tracing::info!("Virus scanning disabled by configuration");
        return Ok(None);
    }

    let scanner: Arc<dyn VirusScanner> = match config.scan_backend {
        ScanBackend::ClamScan => Arc::new(clamav::ClamScanCommand::with_timeout(
            &config.clamscan_path,
            config.scan_timeout(),
        )),
        #[cfg(feature = "clamd")]
        ScanBackend::Clamd => Arc::new(clamav::ClamdScanner::with_timeout(
            config.clamav_host.clone(),
            config.clamav_port,
            config.scan_timeout(),
        )),
        #[cfg(not(feature = "clamd"))]
        ScanBackend::Clamd => {
            anyhow::bail!("INTAKE_SCAN_BACKEND=clamd requires the 'clamd' feature")
        }
    };

    tracing::info!(
        engine = scanner.engine_name(),
        timeout_secs = config.scan_timeout_secs,
        "Virus scanner configured"
    );
    Ok(Some(scanner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> IntakeConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        IntakeConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[test]
    fn disabled_scanning_builds_nothing() {
        let config = config_from(&[("INTAKE_VIRUS_SCAN_ENABLED", "false")]);
        assert!(scanner_from_config(&config).unwrap().is_none());
    }

    #[test]
    fn clamscan_is_the_default_backend() {
        let config = config_from(&[]);
        let scanner = scanner_from_config(&config).unwrap().unwrap();
        assert_eq!(scanner.engine_name(), "clamscan");
    }

    #[cfg(feature = "clamd")]
    #[test]
    fn clamd_backend() {
        let config = config_from(&[("INTAKE_SCAN_BACKEND", "clamd")]);
        let scanner = scanner_from_config(&config).unwrap().unwrap();
        assert_eq!(scanner.engine_name(), "clamd");
    }
}
