//! Target lifecycle state machine
//!
//! A [`Target`] owns everything known about one device under test for the
//! length of a run: the deployment record, whether it is powered on, and
//! the interactive shell session once it has booted.
//!
//! ```text
//! Uninitialized ──deploy──▶ Deployed ──power_on──▶ RebootingToBootloader
//!                                                        │
//!     ShellReady ◀── WaitingForDevice ◀── Booting ◀──────┘
//! ```
//!
//! Each step is a slow external operation, so the state is tracked only for
//! reporting. A failed step leaves the target in the state it failed in.

use std::path::PathBuf;
use std::sync::Arc;

use lavactl_core::config::BoardConfig;
use lavactl_core::error::{Error, Result};
use lavactl_core::executor::{CommandExecutor, HostExecutor};
use lavactl_core::image::{ImageSource, LocalImageSource};
use lavactl_core::mount::{with_writable_mount, SYSTEM_MOUNT_POINT};
use lavactl_core::runner::ShellRunner;
use lavactl_core::session::InteractiveSession;

use crate::deployment::DeploymentData;
use crate::transport::DeviceTransport;

/// Lifecycle position of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// Nothing deployed yet
    Uninitialized,
    /// Images flashed, device not booted by us
    Deployed,
    /// Asked the device to enter its bootloader
    RebootingToBootloader,
    /// Writing images
    Flashing,
    /// Handing the boot image to the bootloader
    Booting,
    /// Waiting for the booted device to enumerate
    WaitingForDevice,
    /// Booted with a live shell session
    ShellReady,
}

/// Token for the session of one boot
///
/// Every successful power-on issues a new token. Tokens from earlier boots
/// are rejected with [`Error::StaleSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Boot generation this token belongs to
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Live session of a booted device
pub(crate) struct Booted {
    pub(crate) session: Box<dyn InteractiveSession>,
    pub(crate) prompt: String,
    generation: u64,
}

/// Files relocated out of the terminfo tree before it is emptied
const TERMINFO_CLEANUP: [&str; 4] = [
    "mv /system/etc/terminfo/v/vt100 /system/etc",
    "rm -r /system/etc/terminfo/*",
    "mkdir /system/etc/terminfo/v",
    "mv /system/etc/vt100 /system/etc/terminfo/v/",
];

/// A device under test
pub struct Target<E, I> {
    pub(crate) board: Arc<BoardConfig>,
    pub(crate) transport: DeviceTransport<E>,
    images: I,
    deployment: Option<DeploymentData>,
    pub(crate) booted: Option<Booted>,
    generation: u64,
    state: TargetState,
}

impl Target<HostExecutor, LocalImageSource> {
    /// Target driven by the host's real tools, staging local images
    pub fn host(board: Arc<BoardConfig>) -> Self {
        Self::new(board, HostExecutor::new(), LocalImageSource::new())
    }
}

impl<E: CommandExecutor, I: ImageSource> Target<E, I> {
    /// Create a target for `board`
    pub fn new(board: Arc<BoardConfig>, executor: E, images: I) -> Self {
        let transport = DeviceTransport::new(executor, &board);
        Self {
            board,
            transport,
            images,
            deployment: None,
            booted: None,
            generation: 0,
            state: TargetState::Uninitialized,
        }
    }

    /// Board configuration
    pub fn board(&self) -> &BoardConfig {
        &self.board
    }

    /// Current lifecycle position
    pub fn state(&self) -> TargetState {
        self.state
    }

    /// Whether the device is booted with a live session
    pub fn powered_on(&self) -> bool {
        self.booted.is_some()
    }

    /// Record of the last successful deploy
    pub fn deployment(&self) -> Option<&DeploymentData> {
        self.deployment.as_ref()
    }

    /// The transport the target drives
    pub fn transport(&self) -> &DeviceTransport<E> {
        &self.transport
    }

    fn acquire(&self, reference: &str) -> Result<PathBuf> {
        self.images.acquire(reference, &self.board.scratch_dir, false)
    }

    /// Flash a boot/system/userdata image set
    ///
    /// Images are staged first, then the device is rebooted towards a known
    /// state, the boot partition erased and system and userdata flashed.
    /// The boot image is not flashed; power-on hands it to the bootloader.
    ///
    /// Any flashing failure is fatal and leaves no deployment recorded.
    pub fn deploy(&mut self, boot: &str, system: &str, userdata: &str) -> Result<()> {
        log::info!("Deploying to {}", self.board.name);

        let boot = self.acquire(boot)?;
        let system = self.acquire(system)?;
        let userdata = self.acquire(userdata)?;

        // A partially flashed device must not be booted with the old record
        self.deployment = None;

        self.reboot();

        self.state = TargetState::Flashing;
        self.transport.control("erase boot", false)?;
        self.transport
            .control(&format!("flash system {}", system.display()), false)?;
        self.transport
            .control(&format!("flash userdata {}", userdata.display()), false)?;

        let mut data = DeploymentData::android(boot);
        data.set("system_image", system.display().to_string());
        data.set("userdata_image", userdata.display().to_string());
        self.deployment = Some(data);
        self.state = TargetState::Deployed;

        log::info!("Deployed to {}", self.board.name);
        Ok(())
    }

    /// Ask the running OS to reboot, then wait for it to settle
    ///
    /// The device may not be running the OS at all, so a refused reboot is
    /// ignored. Any live session is closed and its token becomes stale.
    pub fn reboot(&mut self) {
        self.drop_session();

        if let Err(e) = self.transport.shell("reboot", true) {
            log::debug!("Ignoring reboot failure: {}", e);
        }
        self.transport.settle(self.board.timing.reboot_settle());

        self.state = if self.deployment.is_some() {
            TargetState::Deployed
        } else {
            TargetState::Uninitialized
        };
    }

    /// Boot the deployed image and open a shell on it
    ///
    /// A failure before the session is bound leaves the target powered off
    /// with its deployment intact, so power-on can be retried from scratch.
    /// A failure in the post-boot cleanup closes the new session.
    pub fn power_on(&mut self) -> Result<SessionId> {
        let deployment = self.deployment.as_ref().ok_or(Error::NotDeployed)?;
        let boot_image = deployment.boot_image().to_path_buf();
        let prompt = self
            .board
            .tester_ps1
            .clone()
            .unwrap_or_else(|| deployment.tester_ps1().to_string());

        log::info!("Powering on {}", self.board.name);
        self.reboot();

        self.state = TargetState::RebootingToBootloader;
        self.transport.control("reboot", false)?;
        self.transport.settle(self.board.timing.bootloader_settle());

        self.state = TargetState::Booting;
        self.transport
            .control(&format!("boot {}", boot_image.display()), false)?;

        self.state = TargetState::WaitingForDevice;
        self.transport.shell("wait-for-device", false)?;

        let mut session = self.transport.shell_interactive("shell")?;
        // Puts the shell into a reasonable state before the prompt is set
        session.send_line("")?;
        session.send_line(&format!("export PS1='{}'", prompt))?;

        self.generation += 1;
        self.booted = Some(Booted {
            session,
            prompt,
            generation: self.generation,
        });
        self.state = TargetState::ShellReady;
        log::info!("{} is up (session {})", self.board.name, self.generation);

        if let Err(e) = self.cleanup_terminfo() {
            log::error!("Post-boot cleanup failed on {}: {}", self.board.name, e);
            self.drop_session();
            return Err(e);
        }

        Ok(SessionId(self.generation))
    }

    /// Thin out /system/etc/terminfo so pulls and pushes of /system/etc stay fast
    fn cleanup_terminfo(&mut self) -> Result<()> {
        let runner = self.runner()?;
        with_writable_mount(runner, SYSTEM_MOUNT_POINT, |runner| {
            for command in TERMINFO_CLEANUP {
                runner.run(command)?;
            }
            Ok(())
        })
    }

    fn drop_session(&mut self) {
        if let Some(mut booted) = self.booted.take() {
            log::debug!("Closing session {}", booted.generation);
            if let Err(e) = booted.session.close() {
                log::warn!("Failed to close session {}: {}", booted.generation, e);
            }
        }
    }

    /// Session of the current boot
    pub fn session(&mut self, id: SessionId) -> Result<&mut dyn InteractiveSession> {
        match self.booted.as_mut() {
            Some(booted) if booted.generation == id.0 => Ok(booted.session.as_mut()),
            Some(booted) => Err(Error::StaleSession {
                generation: id.0,
                current: booted.generation,
            }),
            None => Err(Error::StaleSession {
                generation: id.0,
                current: 0,
            }),
        }
    }

    /// Command runner bound to the current session
    pub fn runner(&mut self) -> Result<ShellRunner<'_>> {
        let booted = self.booted.as_mut().ok_or(Error::NotPoweredOn)?;
        Ok(ShellRunner::new(booted.session.as_mut(), &booted.prompt))
    }

    /// Run a shell command on the device, powering it on first if needed
    pub fn run(&mut self, command: &str) -> Result<String> {
        if !self.powered_on() {
            self.power_on()?;
        }
        self.runner()?.run(command)
    }

    /// Power the device off
    pub fn power_off(&mut self) -> Result<()> {
        Err(Error::NotImplemented("power_off"))
    }

    /// Unpack a tarball straight into a partition directory
    pub fn extract_tarball(
        &mut self,
        _tarball_url: &str,
        _partition: &str,
        _directory: &str,
    ) -> Result<()> {
        Err(Error::NotImplemented("extract_tarball"))
    }

    /// Version of the device tooling on the host
    ///
    /// Reads nothing from the device and changes no state.
    pub fn device_version(&self) -> Result<String> {
        self.transport.shell_capture("version | sed 's/.* version //'")
    }
}

impl<E, I> Drop for Target<E, I> {
    fn drop(&mut self) {
        if let Some(mut booted) = self.booted.take() {
            if let Err(e) = booted.session.close() {
                log::warn!("Failed to close session {}: {}", booted.generation, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lavactl_dummy::{DummyHost, DummyImages, Event};
    use std::time::Duration;

    fn board() -> BoardConfig {
        BoardConfig::new("nexus")
            .with_partition("system_partition", "/system")
            .with_partition("data_partition", "/data")
    }

    fn target(host: &DummyHost) -> Target<DummyHost, DummyImages> {
        Target::new(Arc::new(board()), host.clone(), host.images())
    }

    fn run(command: &str) -> impl Fn(&Event) -> bool + '_ {
        move |e: &Event| matches!(e, Event::Run { command: c, .. } if c == command)
    }

    fn deployed(host: &DummyHost) -> Target<DummyHost, DummyImages> {
        let mut target = target(host);
        target.deploy("b.img", "s.img", "u.img").unwrap();
        host.clear();
        target
    }

    #[test]
    fn test_deploy_sequence() {
        let host = DummyHost::new();
        let mut target = target(&host);
        target.deploy("b.img", "s.img", "u.img").unwrap();

        let events = host.events();
        let first_run = events
            .iter()
            .position(|e| matches!(e, Event::Run { .. }))
            .unwrap();
        let acquired: Vec<_> = events[..first_run]
            .iter()
            .filter_map(|e| match e {
                Event::Acquire { reference, decompress } => {
                    assert!(!decompress);
                    Some(reference.as_str())
                }
                _ => None,
            })
            .collect();
        assert_eq!(acquired, vec!["b.img", "s.img", "u.img"]);

        assert_eq!(
            host.commands(),
            vec![
                "adb reboot",
                "fastboot erase boot",
                "fastboot flash system s.img",
                "fastboot flash userdata u.img",
            ]
        );

        let data = target.deployment().unwrap();
        assert_eq!(data.boot_image(), PathBuf::from("b.img"));
        assert_eq!(data.tester_ps1(), crate::ANDROID_TESTER_PS1);
        assert_eq!(data.get("system_image"), Some("s.img"));
        assert_eq!(target.state(), TargetState::Deployed);
        assert!(!target.powered_on());
    }

    #[test]
    fn test_deploy_erases_before_flashing() {
        let host = DummyHost::new();
        target(&host).deploy("b.img", "s.img", "u.img").unwrap();
        let erase = host.position(run("fastboot erase boot")).unwrap();
        let flash = host
            .position(|e| matches!(e, Event::Run { command, .. } if command.starts_with("fastboot flash")))
            .unwrap();
        assert!(erase < flash);
    }

    #[test]
    fn test_deploy_flash_failure_is_fatal() {
        let host = DummyHost::new();
        host.fail("fastboot flash system s.img");
        let mut target = target(&host);
        assert!(matches!(
            target.deploy("b.img", "s.img", "u.img"),
            Err(Error::CommandFailed { .. })
        ));
        assert!(target.deployment().is_none());
        assert_eq!(target.state(), TargetState::Flashing);
        assert!(host.position(run("fastboot flash userdata u.img")).is_none());
    }

    #[test]
    fn test_failed_redeploy_forgets_old_deployment() {
        let host = DummyHost::new();
        let mut target = deployed(&host);
        host.fail("fastboot erase boot");
        assert!(target.deploy("b2.img", "s.img", "u.img").is_err());
        assert!(matches!(target.power_on(), Err(Error::NotDeployed)));
    }

    #[test]
    fn test_deploy_image_failure_touches_nothing() {
        let host = DummyHost::new();
        host.fail("u.img");
        let mut target = target(&host);
        assert!(target.deploy("b.img", "s.img", "u.img").is_err());
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_reboot_never_fails() {
        let host = DummyHost::new();
        host.fail("adb reboot");
        let mut target = target(&host);
        target.reboot();

        assert_eq!(
            host.events(),
            vec![
                Event::Run {
                    command: "adb reboot".into(),
                    tolerate_failure: true
                },
                Event::Settle(Duration::from_secs(10)),
            ]
        );
    }

    #[test]
    fn test_power_on_requires_deploy() {
        let host = DummyHost::new();
        let mut target = target(&host);
        assert!(matches!(target.power_on(), Err(Error::NotDeployed)));
        assert!(host.events().is_empty());
        assert_eq!(host.sessions_spawned(), 0);
        assert!(!target.powered_on());
    }

    #[test]
    fn test_power_on_sequence() {
        let host = DummyHost::new();
        let mut target = deployed(&host);
        let id = target.power_on().unwrap();

        assert!(target.powered_on());
        assert_eq!(target.state(), TargetState::ShellReady);
        assert_eq!(id.generation(), 1);

        assert_eq!(
            host.commands(),
            vec!["adb reboot", "fastboot reboot", "fastboot boot b.img", "adb wait-for-device"]
        );

        let settles: Vec<_> = host
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Settle(_)))
            .collect();
        assert_eq!(settles.len(), 2);

        let bootloader = host.position(run("fastboot reboot")).unwrap();
        let boot = host.position(run("fastboot boot b.img")).unwrap();
        let settle = host.position(|e| matches!(e, Event::Settle(_))).unwrap();
        assert!(settle < bootloader);
        assert!(matches!(host.events()[bootloader + 1], Event::Settle(_)));
        assert!(bootloader + 1 < boot);

        assert_eq!(
            host.session_commands(1),
            vec![
                "",
                "export PS1='root@linaro# '",
                "mount -o remount,rw /system",
                "mv /system/etc/terminfo/v/vt100 /system/etc",
                "rm -r /system/etc/terminfo/*",
                "mkdir /system/etc/terminfo/v",
                "mv /system/etc/vt100 /system/etc/terminfo/v/",
                "mount -o remount,ro /system",
            ]
        );
    }

    #[test]
    fn test_board_prompt_overrides_deployment() {
        let host = DummyHost::new();
        let mut board = board();
        board.tester_ps1 = Some("lab# ".into());
        let mut target = Target::new(Arc::new(board), host.clone(), host.images());
        target.deploy("b.img", "s.img", "u.img").unwrap();
        target.power_on().unwrap();
        assert!(host
            .session_commands(1)
            .contains(&"export PS1='lab# '".to_string()));
    }

    #[test]
    fn test_power_on_bootloader_failure() {
        let host = DummyHost::new();
        let mut target = deployed(&host);
        host.fail("fastboot reboot");
        assert!(target.power_on().is_err());
        assert!(!target.powered_on());
        assert!(target.deployment().is_some());
        assert_eq!(host.sessions_spawned(), 0);

        // Retry from scratch once the device behaves
        host.succeed("fastboot reboot");
        target.power_on().unwrap();
        assert!(target.powered_on());
    }

    #[test]
    fn test_power_on_spawn_failure() {
        let host = DummyHost::new();
        let mut target = deployed(&host);
        host.fail_spawn(true);
        assert!(matches!(target.power_on(), Err(Error::SpawnFailed { .. })));
        assert!(!target.powered_on());
        assert_eq!(target.state(), TargetState::WaitingForDevice);
    }

    #[test]
    fn test_power_on_cleanup_failure() {
        let host = DummyHost::new();
        let mut target = deployed(&host);
        host.fail("rm -r /system/etc/terminfo/*");
        assert!(matches!(
            target.power_on(),
            Err(Error::CommandFailed { code: Some(1), .. })
        ));
        assert!(!target.powered_on());

        // Mount restored and the half-cleaned session closed
        let lines = host.session_commands(1);
        assert_eq!(lines.last().unwrap(), "mount -o remount,ro /system");
        assert!(!lines.contains(&"mkdir /system/etc/terminfo/v".to_string()));
        assert!(host.events().contains(&Event::SessionClosed(1)));
    }

    #[test]
    fn test_new_session_each_power_on() {
        let host = DummyHost::new();
        let mut target = deployed(&host);
        let first = target.power_on().unwrap();
        let second = target.power_on().unwrap();

        assert_ne!(first, second);
        assert_eq!(host.sessions_spawned(), 2);
        assert!(host.events().contains(&Event::SessionClosed(1)));
        assert!(target.session(second).is_ok());
        assert!(matches!(
            target.session(first),
            Err(Error::StaleSession { generation: 1, current: 2 })
        ));
    }

    #[test]
    fn test_reboot_invalidates_session() {
        let host = DummyHost::new();
        let mut target = deployed(&host);
        let id = target.power_on().unwrap();
        target.reboot();

        assert!(!target.powered_on());
        assert_eq!(target.state(), TargetState::Deployed);
        assert!(matches!(
            target.session(id),
            Err(Error::StaleSession { generation: 1, current: 0 })
        ));
        assert!(matches!(target.runner(), Err(Error::NotPoweredOn)));
    }

    #[test]
    fn test_run_powers_on() {
        let host = DummyHost::new();
        let mut target = deployed(&host);
        target.run("getprop ro.build.version.release").unwrap();
        target.run("uptime").unwrap();

        assert_eq!(host.sessions_spawned(), 1);
        let lines = host.session_commands(1);
        assert_eq!(&lines[lines.len() - 2..], ["getprop ro.build.version.release", "uptime"]);
    }

    #[test]
    fn test_placeholders() {
        let host = DummyHost::new();
        let mut target = deployed(&host);
        assert!(matches!(target.power_off(), Err(Error::NotImplemented("power_off"))));
        assert!(matches!(
            target.extract_tarball("http://lab/t.tgz", "data_partition", "/"),
            Err(Error::NotImplemented("extract_tarball"))
        ));
        assert!(host.events().is_empty());
    }

    #[test]
    fn test_device_version_is_idempotent() {
        let host = DummyHost::new();
        host.set_output("adb version | sed 's/.* version //'", "1.0.31\n");
        let target = target(&host);

        let first = target.device_version().unwrap();
        let second = target.device_version().unwrap();
        assert_eq!(first, "1.0.31");
        assert_eq!(first, second);
        assert!(host
            .events()
            .iter()
            .all(|e| matches!(e, Event::Capture(_))));
        assert_eq!(target.state(), TargetState::Uninitialized);
    }
}
