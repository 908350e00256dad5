/// Log tags identifying the subsystem that produced a message

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Rpc,
    Websocket,
    Confirm,
    Fees,
}

impl LogTag {
    /// Key used by --debug-<key> flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Rpc => "rpc",
            LogTag::Websocket => "websocket",
            LogTag::Confirm => "confirm",
            LogTag::Fees => "fees",
        }
        .to_string()
    }

    /// Uppercase label without color codes, used for file output
    pub fn to_plain_string(&self) -> String {
        self.to_debug_key().to_uppercase()
    }

    /// Resolve a tag from its debug key
    pub fn from_debug_key(key: &str) -> Option<Self> {
        match key {
            "system" => Some(LogTag::System),
            "config" => Some(LogTag::Config),
            "rpc" => Some(LogTag::Rpc),
            "websocket" | "ws" => Some(LogTag::Websocket),
            "confirm" => Some(LogTag::Confirm),
            "fees" => Some(LogTag::Fees),
            _ => None,
        }
    }
}
