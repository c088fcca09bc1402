//! Module types and their command vocabularies
//!
//! Every module type accepts a small fixed set of keywords. Each keyword
//! is bound to a command variant by an explicit table, and each command
//! maps to the mode change the module is asked to make.

use crate::error::{LmpError, Result};

/// Mode change requested from a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeRequest {
    /// Mode (switch) name on the module
    pub mode: &'static str,
    /// Option to put the mode into
    pub option: &'static str,
}

impl ModeRequest {
    const fn new(mode: &'static str, option: &'static str) -> Self {
        Self { mode, option }
    }
}

/// Accessory module type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// USB switch
    Usb,
    /// HDMI switch with EDID emulation
    Hdmi,
    /// SATA passthrough
    Sata,
    /// Ethernet passthrough
    Eth,
    /// Low-speed GPIO and audio breakout
    Lsgpio,
}

impl ModuleKind {
    /// All module types, in display order
    pub const ALL: [ModuleKind; 5] = [
        ModuleKind::Usb,
        ModuleKind::Hdmi,
        ModuleKind::Sata,
        ModuleKind::Eth,
        ModuleKind::Lsgpio,
    ];

    /// Lowercase name, also the key of default serials in board config
    pub fn name(&self) -> &'static str {
        match self {
            ModuleKind::Usb => "usb",
            ModuleKind::Hdmi => "hdmi",
            ModuleKind::Sata => "sata",
            ModuleKind::Eth => "eth",
            ModuleKind::Lsgpio => "lsgpio",
        }
    }

    /// Marker written back once a command has completed
    pub fn completion_marker(&self) -> String {
        format!("<LAVA_{}_COMPLETE>", self.name().to_uppercase())
    }

    /// Keywords accepted by this module type
    pub fn keywords(&self) -> Vec<&'static str> {
        fn names<C>(table: &[(&'static str, C)]) -> Vec<&'static str> {
            table.iter().map(|(k, _)| *k).collect()
        }
        match self {
            ModuleKind::Usb => names(UsbCommand::TABLE),
            ModuleKind::Hdmi => names(HdmiCommand::TABLE),
            ModuleKind::Sata => names(SataCommand::TABLE),
            ModuleKind::Eth => names(EthCommand::TABLE),
            ModuleKind::Lsgpio => names(LsgpioCommand::TABLE),
        }
    }
}

impl std::str::FromStr for ModuleKind {
    type Err = LmpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "usb" => Ok(ModuleKind::Usb),
            "hdmi" => Ok(ModuleKind::Hdmi),
            "sata" => Ok(ModuleKind::Sata),
            "eth" | "ethernet" => Ok(ModuleKind::Eth),
            "lsgpio" | "gpio" => Ok(ModuleKind::Lsgpio),
            _ => Err(LmpError::UnknownModule(s.to_string())),
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// USB module commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbCommand {
    /// Connect the device port as a USB device
    Device,
    /// Connect the device port as a USB host
    Host,
    /// Disconnect USB
    Disconnect,
}

impl UsbCommand {
    const TABLE: &'static [(&'static str, Self)] = &[
        ("device", Self::Device),
        ("host", Self::Host),
        ("disconnect", Self::Disconnect),
    ];

    fn mode_request(&self) -> ModeRequest {
        match self {
            Self::Device => ModeRequest::new("usb", "device"),
            Self::Host => ModeRequest::new("usb", "host"),
            Self::Disconnect => ModeRequest::new("usb", "disconnect"),
        }
    }
}

/// HDMI module commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdmiCommand {
    /// Pass the HDMI signal through
    Passthru,
    /// Disconnect HDMI
    Disconnect,
    /// Present the module's fake EDID to the device
    FakeEdid,
}

impl HdmiCommand {
    const TABLE: &'static [(&'static str, Self)] = &[
        ("passthru", Self::Passthru),
        ("disconnect", Self::Disconnect),
        ("fakeedid", Self::FakeEdid),
    ];

    fn mode_request(&self) -> ModeRequest {
        match self {
            Self::Passthru => ModeRequest::new("hdmi", "passthru"),
            Self::Disconnect => ModeRequest::new("hdmi", "disconnect"),
            Self::FakeEdid => ModeRequest::new("hdmi", "fake"),
        }
    }
}

/// SATA module commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SataCommand {
    /// Connect the drive to the device
    Passthru,
    /// Disconnect the drive
    Disconnect,
}

impl SataCommand {
    const TABLE: &'static [(&'static str, Self)] = &[
        ("passthru", Self::Passthru),
        ("disconnect", Self::Disconnect),
    ];

    fn mode_request(&self) -> ModeRequest {
        match self {
            Self::Passthru => ModeRequest::new("sata", "passthru"),
            Self::Disconnect => ModeRequest::new("sata", "disconnect"),
        }
    }
}

/// Ethernet module commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthCommand {
    /// Connect the network to the device
    Passthru,
    /// Disconnect the network
    Disconnect,
}

impl EthCommand {
    const TABLE: &'static [(&'static str, Self)] = &[
        ("passthru", Self::Passthru),
        ("disconnect", Self::Disconnect),
    ];

    fn mode_request(&self) -> ModeRequest {
        match self {
            Self::Passthru => ModeRequest::new("eth", "passthru"),
            Self::Disconnect => ModeRequest::new("eth", "disconnect"),
        }
    }
}

/// GPIO module commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LsgpioCommand {
    /// Bank A as inputs
    AIn,
    /// Bank A as outputs
    AOut,
    /// Bank B as inputs
    BIn,
    /// Bank B as outputs
    BOut,
    /// Pass audio through
    Passthru,
    /// Disconnect audio
    Disconnect,
}

impl LsgpioCommand {
    const TABLE: &'static [(&'static str, Self)] = &[
        ("a_in", Self::AIn),
        ("a_out", Self::AOut),
        ("b_in", Self::BIn),
        ("b_out", Self::BOut),
        ("passthru", Self::Passthru),
        ("disconnect", Self::Disconnect),
    ];

    fn mode_request(&self) -> ModeRequest {
        match self {
            Self::AIn => ModeRequest::new("a-dir", "in"),
            Self::AOut => ModeRequest::new("a-dir", "out"),
            Self::BIn => ModeRequest::new("b-dir", "in"),
            Self::BOut => ModeRequest::new("b-dir", "out"),
            Self::Passthru => ModeRequest::new("audio", "passthru"),
            Self::Disconnect => ModeRequest::new("audio", "disconnect"),
        }
    }
}

fn lookup<C: Copy>(table: &[(&'static str, C)], keyword: &str) -> Option<C> {
    table.iter().find(|(k, _)| *k == keyword).map(|(_, c)| *c)
}

/// A parsed signal, tagged by module type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalCommand {
    /// USB module command
    Usb(UsbCommand),
    /// HDMI module command
    Hdmi(HdmiCommand),
    /// SATA module command
    Sata(SataCommand),
    /// Ethernet module command
    Eth(EthCommand),
    /// GPIO module command
    Lsgpio(LsgpioCommand),
}

impl SignalCommand {
    /// Parse `keyword` in the vocabulary of `kind`
    pub fn parse(kind: ModuleKind, keyword: &str) -> Result<Self> {
        let command = match kind {
            ModuleKind::Usb => lookup(UsbCommand::TABLE, keyword).map(Self::Usb),
            ModuleKind::Hdmi => lookup(HdmiCommand::TABLE, keyword).map(Self::Hdmi),
            ModuleKind::Sata => lookup(SataCommand::TABLE, keyword).map(Self::Sata),
            ModuleKind::Eth => lookup(EthCommand::TABLE, keyword).map(Self::Eth),
            ModuleKind::Lsgpio => lookup(LsgpioCommand::TABLE, keyword).map(Self::Lsgpio),
        };
        command.ok_or_else(|| LmpError::UnknownCommand {
            kind: kind.name(),
            keyword: keyword.to_string(),
        })
    }

    /// Module type this command is for
    pub fn kind(&self) -> ModuleKind {
        match self {
            Self::Usb(_) => ModuleKind::Usb,
            Self::Hdmi(_) => ModuleKind::Hdmi,
            Self::Sata(_) => ModuleKind::Sata,
            Self::Eth(_) => ModuleKind::Eth,
            Self::Lsgpio(_) => ModuleKind::Lsgpio,
        }
    }

    /// Mode change that carries out this command
    pub fn mode_request(&self) -> ModeRequest {
        match self {
            Self::Usb(c) => c.mode_request(),
            Self::Hdmi(c) => c.mode_request(),
            Self::Sata(c) => c.mode_request(),
            Self::Eth(c) => c.mode_request(),
            Self::Lsgpio(c) => c.mode_request(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gpio() {
        let cmd = SignalCommand::parse(ModuleKind::Lsgpio, "a_in").unwrap();
        assert_eq!(cmd, SignalCommand::Lsgpio(LsgpioCommand::AIn));
        assert_eq!(cmd.kind(), ModuleKind::Lsgpio);
        assert_eq!(cmd.mode_request(), ModeRequest::new("a-dir", "in"));

        let cmd = SignalCommand::parse(ModuleKind::Lsgpio, "passthru").unwrap();
        assert_eq!(cmd.mode_request(), ModeRequest::new("audio", "passthru"));
    }

    #[test]
    fn test_keywords_are_per_kind() {
        assert!(SignalCommand::parse(ModuleKind::Sata, "passthru").is_ok());
        assert!(matches!(
            SignalCommand::parse(ModuleKind::Sata, "fakeedid"),
            Err(LmpError::UnknownCommand { kind: "sata", .. })
        ));
        assert!(SignalCommand::parse(ModuleKind::Hdmi, "fakeedid").is_ok());
        assert!(SignalCommand::parse(ModuleKind::Usb, "A_IN").is_err());
    }

    #[test]
    fn test_every_keyword_parses() {
        for kind in ModuleKind::ALL {
            for keyword in kind.keywords() {
                let cmd = SignalCommand::parse(kind, keyword).unwrap();
                assert_eq!(cmd.kind(), kind);
            }
        }
        assert_eq!(
            ModuleKind::Lsgpio.keywords(),
            vec!["a_in", "a_out", "b_in", "b_out", "passthru", "disconnect"]
        );
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("USB".parse::<ModuleKind>().unwrap(), ModuleKind::Usb);
        assert_eq!("gpio".parse::<ModuleKind>().unwrap(), ModuleKind::Lsgpio);
        assert!(matches!(
            "sdmux".parse::<ModuleKind>(),
            Err(LmpError::UnknownModule(name)) if name == "sdmux"
        ));
    }

    #[test]
    fn test_completion_marker() {
        assert_eq!(ModuleKind::Lsgpio.completion_marker(), "<LAVA_LSGPIO_COMPLETE>");
        assert_eq!(ModuleKind::Eth.completion_marker(), "<LAVA_ETH_COMPLETE>");
    }
}
