/// Host-supplied configuration (§6.3). The engine never reads the process
/// environment itself; the host constructs one of these however it likes
/// (file, env, service discovery) and passes it in.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HostConfig {
    pub db_engine: String,
    pub db_echo: bool,
    pub global_email_language: String,
    pub test_mode: bool,
    pub dev_mode: bool,
    /// When set, currency `pip` defaults shrink (USD=100, BTC=10^4)
    /// instead of the usual `10^8` — see [`exchange_core::Currency::default_pip`].
    pub satoshi_mode: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            db_engine: "postgresql".to_string(),
            db_echo: false,
            global_email_language: "en".to_string(),
            test_mode: false,
            dev_mode: false,
            satoshi_mode: false,
        }
    }
}

impl HostConfig {
    pub fn test() -> Self {
        Self {
            test_mode: true,
            dev_mode: true,
            ..Self::default()
        }
    }
}
