// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! X10 dimmers exposed as light entities.
//!
//! A [`MochadLight`] translates on/off/brightness requests into mochad
//! commands. Classic X10 dimmers (32 levels) only understand relative
//! `dim`/`bright` steps, so the light tracks the brightness it assumes the
//! module is at and sends the difference. Extended modules (64 or 256 levels)
//! take an absolute `xdim` level instead.
//!
//! Sends are best-effort. A missing connection or a failed write is logged
//! and the assumed state is updated anyway, because X10 gives no feedback to
//! compare it against.

use std::sync::Arc;

use crate::LightFeatures;
use crate::command::X10Command;
use crate::config::LightConfig;
use crate::protocol::{DispatchGuard, Dispatcher, MochadConnection, Transport};
use crate::state::LightState;
use crate::types::{BrightnessLevels, CommType, X10Address};

/// A dimmer addressed through the controller's shared dispatcher.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use mochad_lib::config::LightConfig;
/// use mochad_lib::light::MochadLight;
/// use mochad_lib::protocol::{Dispatcher, MochadConnection};
///
/// # async fn example() -> mochad_lib::Result<()> {
/// let dispatcher = Arc::new(Dispatcher::with_transport(
///     MochadConnection::connect("localhost", 1099).await?,
/// ));
/// let mut light = MochadLight::new(dispatcher, &LightConfig::new("a1".parse()?));
///
/// light.turn_on(Some(128)).await;
/// assert!(light.is_on());
/// assert_eq!(light.brightness(), 128);
///
/// light.turn_off().await;
/// # Ok(())
/// # }
/// ```
pub struct MochadLight<T = MochadConnection> {
    dispatcher: Arc<Dispatcher<T>>,
    address: X10Address,
    name: String,
    comm_type: CommType,
    levels: BrightnessLevels,
    state: LightState,
}

impl<T: Transport> MochadLight<T> {
    /// Creates a light from its configuration, initially off.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher<T>>, config: &LightConfig) -> Self {
        Self {
            dispatcher,
            address: config.address(),
            name: config.entity_name(),
            comm_type: config.comm_type(),
            levels: config.brightness_levels(),
            state: LightState::new(),
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the X10 address.
    #[must_use]
    pub fn address(&self) -> X10Address {
        self.address
    }

    /// Returns the comm type commands are sent with.
    #[must_use]
    pub fn comm_type(&self) -> CommType {
        self.comm_type
    }

    /// Returns the number of brightness levels of the module.
    #[must_use]
    pub fn brightness_levels(&self) -> BrightnessLevels {
        self.levels
    }

    /// Returns `true` if the light is assumed on. Never queries the daemon.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }

    /// Returns the assumed brightness (0-255). Never queries the daemon.
    #[must_use]
    pub fn brightness(&self) -> u8 {
        self.state.brightness()
    }

    /// Returns a snapshot of the assumed state.
    #[must_use]
    pub fn state(&self) -> LightState {
        self.state
    }

    /// X10 is one-way, so the state is always assumed.
    #[must_use]
    pub fn assumed_state(&self) -> bool {
        true
    }

    /// Returns the supported features.
    #[must_use]
    pub fn supported_features(&self) -> LightFeatures {
        LightFeatures::BRIGHTNESS
    }

    /// Turns the light on at `brightness` (full brightness if `None`).
    ///
    /// The whole command sequence runs under the dispatch lock. The assumed
    /// state becomes on at the requested brightness whatever the transport
    /// outcome.
    pub async fn turn_on(&mut self, brightness: Option<u8>) {
        let target = brightness.unwrap_or(u8::MAX);
        let dispatcher = Arc::clone(&self.dispatcher);
        let mut link = dispatcher.lock().await;

        if self.levels.is_extended() {
            let level = self.levels.scale(target);
            self.send(&mut link, X10Command::Xdim(level)).await;
            link.read_data().await;
        } else {
            self.send(&mut link, X10Command::On).await;
            link.read_data().await;
            // A fresh "on" brings a classic module to full brightness
            if self.state.brightness() == 0 {
                self.state.set_brightness(u8::MAX);
            }
            self.adjust_brightness(&mut link, target).await;
        }
        drop(link);

        self.state.set_brightness(target);
        self.state.set_on(true);
    }

    /// Turns the light off.
    ///
    /// Classic modules forget their level when switched off, so the tracked
    /// brightness of a 32-level light is reset to 0.
    pub async fn turn_off(&mut self) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let mut link = dispatcher.lock().await;

        self.send(&mut link, X10Command::Off).await;
        link.read_data().await;
        if !self.levels.is_extended() {
            self.state.set_brightness(0);
        }
        drop(link);

        self.state.set_on(false);
    }

    /// Sends a single command to this light under the dispatch lock.
    ///
    /// Does nothing if the controller is not connected. Does not drain the
    /// daemon's echo and does not change the assumed state.
    pub async fn send_cmd(&self, command: X10Command) {
        let mut link = self.dispatcher.lock().await;
        self.send(&mut link, command).await;
    }

    /// Asks the daemon whether it last saw this unit switched on.
    ///
    /// Returns `false` when the controller is not connected or the status
    /// dump cannot be read.
    pub async fn device_status(&self) -> bool {
        let mut link = self.dispatcher.lock().await;
        let Some(mut device) = link.device(self.address, self.comm_type) else {
            return false;
        };

        match device.get_status().await {
            Ok(on) => on,
            Err(e) => {
                tracing::debug!(address = %self.address, error = %e, "Status query failed");
                false
            }
        }
    }

    async fn adjust_brightness(&self, link: &mut DispatchGuard<'_, T>, target: u8) {
        let current = self.state.brightness();
        let command = match current.cmp(&target) {
            std::cmp::Ordering::Greater => X10Command::Dim(self.levels.scale(current - target)),
            std::cmp::Ordering::Less => X10Command::Bright(self.levels.scale(target - current)),
            std::cmp::Ordering::Equal => return,
        };

        self.send(link, command).await;
        link.read_data().await;
    }

    async fn send(&self, link: &mut DispatchGuard<'_, T>, command: X10Command) {
        let Some(mut device) = link.device(self.address, self.comm_type) else {
            tracing::debug!(
                address = %self.address,
                command = %command,
                "Not connected to mochad, dropping command"
            );
            return;
        };

        tracing::debug!(address = %self.address, command = %command, "Sending X10 command");
        if let Err(e) = device.send_cmd(&command.to_string()).await {
            tracing::debug!(
                address = %self.address,
                command = %command,
                error = %e,
                "Failed to send X10 command"
            );
        }
    }
}

impl<T> std::fmt::Debug for MochadLight<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MochadLight")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("comm_type", &self.comm_type)
            .field("levels", &self.levels)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::mock::{FLUSH, RecordingTransport};

    fn config(address: &str, levels: BrightnessLevels) -> LightConfig {
        LightConfig::new(address.parse().unwrap()).with_brightness_levels(levels)
    }

    fn light(
        transport: &RecordingTransport,
        levels: BrightnessLevels,
    ) -> MochadLight<RecordingTransport> {
        let dispatcher = Arc::new(Dispatcher::with_transport(transport.clone()));
        MochadLight::new(dispatcher, &config("a1", levels))
    }

    fn clear(transport: &RecordingTransport) {
        transport.log.lock().clear();
    }

    // ========================================================================
    // Properties
    // ========================================================================

    #[test]
    fn defaults_from_config() {
        let transport = RecordingTransport::new();
        let light = light(&transport, BrightnessLevels::Levels32);

        assert_eq!(light.name(), "x10_light_dev_a1");
        assert_eq!(light.address().to_string(), "a1");
        assert_eq!(light.comm_type(), CommType::PowerLine);
        assert!(!light.is_on());
        assert_eq!(light.brightness(), 0);
        assert!(light.assumed_state());
        assert!(light.supported_features().contains(LightFeatures::BRIGHTNESS));
    }

    #[test]
    fn reading_state_sends_nothing() {
        let transport = RecordingTransport::new();
        let light = light(&transport, BrightnessLevels::Levels32);

        let _ = (light.is_on(), light.brightness(), light.state());
        assert!(transport.lines().is_empty());
    }

    // ========================================================================
    // 32 levels
    // ========================================================================

    #[tokio::test]
    async fn classic_full_brightness_from_fresh_state() {
        let transport = RecordingTransport::new();
        let mut light = light(&transport, BrightnessLevels::Levels32);

        light.turn_on(None).await;

        assert_eq!(transport.lines(), vec!["pl a1 on", FLUSH]);
        assert!(light.is_on());
        assert_eq!(light.brightness(), 255);
    }

    #[tokio::test]
    async fn classic_dims_from_tracked_brightness() {
        let transport = RecordingTransport::new();
        let mut light = light(&transport, BrightnessLevels::Levels32);

        light.turn_on(Some(255)).await;
        clear(&transport);
        light.turn_on(Some(128)).await;

        assert_eq!(
            transport.lines(),
            vec!["pl a1 on", FLUSH, "pl a1 dim 15", FLUSH]
        );
        assert!(light.is_on());
        assert_eq!(light.brightness(), 128);
    }

    #[tokio::test]
    async fn classic_brightens_when_target_is_higher() {
        let transport = RecordingTransport::new();
        let mut light = light(&transport, BrightnessLevels::Levels32);

        light.turn_on(Some(64)).await;
        assert_eq!(transport.commands(), vec!["pl a1 on", "pl a1 dim 23"]);

        clear(&transport);
        light.turn_on(Some(200)).await;
        assert_eq!(transport.commands(), vec!["pl a1 on", "pl a1 bright 16"]);
        assert_eq!(light.brightness(), 200);
    }

    #[tokio::test]
    async fn classic_off_resets_tracked_brightness() {
        let transport = RecordingTransport::new();
        let mut light = light(&transport, BrightnessLevels::Levels32);

        light.turn_on(Some(128)).await;
        light.turn_off().await;
        assert!(!light.is_on());
        assert_eq!(light.brightness(), 0);

        // Back from full brightness, as after a fresh start
        clear(&transport);
        light.turn_on(Some(128)).await;
        assert_eq!(transport.commands(), vec!["pl a1 on", "pl a1 dim 15"]);
    }

    // ========================================================================
    // Extended levels
    // ========================================================================

    #[tokio::test]
    async fn extended_uses_absolute_level() {
        let transport = RecordingTransport::new();
        let mut light = light(&transport, BrightnessLevels::Levels64);

        light.turn_on(Some(128)).await;

        assert_eq!(transport.lines(), vec!["pl a1 xdim 31", FLUSH]);
        assert_eq!(light.brightness(), 128);
    }

    #[tokio::test]
    async fn extended_256_levels_pass_through() {
        let transport = RecordingTransport::new();
        let mut light = light(&transport, BrightnessLevels::Levels256);

        light.turn_on(None).await;
        light.turn_on(Some(7)).await;

        assert_eq!(transport.commands(), vec!["pl a1 xdim 255", "pl a1 xdim 7"]);
    }

    #[tokio::test]
    async fn extended_off_keeps_brightness() {
        let transport = RecordingTransport::new();
        let mut light = light(&transport, BrightnessLevels::Levels64);

        light.turn_on(Some(100)).await;
        light.turn_off().await;

        assert_eq!(transport.commands(), vec!["pl a1 xdim 24", "pl a1 off"]);
        assert!(!light.is_on());
        assert_eq!(light.brightness(), 100);
    }

    #[tokio::test]
    async fn rf_lights_use_rf_prefix() {
        let transport = RecordingTransport::new();
        let dispatcher = Arc::new(Dispatcher::with_transport(transport.clone()));
        let mut light = MochadLight::new(
            dispatcher,
            &config("b3", BrightnessLevels::Levels32).with_comm_type(CommType::RadioFrequency),
        );

        light.turn_off().await;
        assert_eq!(transport.commands(), vec!["rf b3 off"]);
    }

    // ========================================================================
    // Brightness targets
    // ========================================================================

    #[tokio::test]
    async fn every_target_is_tracked_at_every_level_count() {
        for levels in [
            BrightnessLevels::Levels32,
            BrightnessLevels::Levels64,
            BrightnessLevels::Levels256,
        ] {
            let transport = RecordingTransport::new();
            let mut light = light(&transport, levels);

            for target in 0..=u8::MAX {
                light.turn_on(Some(target)).await;
                assert!(light.is_on(), "{levels} levels, target {target}");
                assert_eq!(light.brightness(), target, "{levels} levels");
            }
        }
    }

    #[tokio::test]
    async fn classic_zero_target_dims_all_the_way() {
        let transport = RecordingTransport::new();
        let mut light = light(&transport, BrightnessLevels::Levels32);

        light.turn_on(Some(0)).await;
        assert_eq!(
            transport.lines(),
            vec!["pl a1 on", FLUSH, "pl a1 dim 31", FLUSH]
        );
        assert!(light.is_on());
        assert_eq!(light.brightness(), 0);

        // Tracked brightness 0 reads as a fresh module at full brightness
        clear(&transport);
        light.turn_on(Some(255)).await;
        assert_eq!(transport.lines(), vec!["pl a1 on", FLUSH]);
        assert_eq!(light.brightness(), 255);
    }

    #[tokio::test]
    async fn extended_64_level_boundaries() {
        let transport = RecordingTransport::new();
        let mut light = light(&transport, BrightnessLevels::Levels64);

        for target in [0, 1, 254, 255] {
            light.turn_on(Some(target)).await;
        }

        assert_eq!(
            transport.commands(),
            vec![
                "pl a1 xdim 0",
                "pl a1 xdim 0",
                "pl a1 xdim 62",
                "pl a1 xdim 63"
            ]
        );
    }

    #[tokio::test]
    async fn extended_256_level_boundaries() {
        let transport = RecordingTransport::new();
        let mut light = light(&transport, BrightnessLevels::Levels256);

        for target in [0, 1, 254, 255] {
            light.turn_on(Some(target)).await;
        }

        assert_eq!(
            transport.lines(),
            vec![
                "pl a1 xdim 0",
                FLUSH,
                "pl a1 xdim 1",
                FLUSH,
                "pl a1 xdim 254",
                FLUSH,
                "pl a1 xdim 255",
                FLUSH
            ]
        );
    }

    // ========================================================================
    // Degraded transport
    // ========================================================================

    #[tokio::test]
    async fn state_is_optimistic_when_sends_fail() {
        let transport = RecordingTransport::failing();
        let mut light = light(&transport, BrightnessLevels::Levels32);

        light.turn_on(Some(90)).await;

        assert!(transport.commands().is_empty());
        assert!(light.is_on());
        assert_eq!(light.brightness(), 90);
    }

    #[tokio::test]
    async fn disconnected_light_is_a_no_op() {
        let dispatcher: Arc<Dispatcher<RecordingTransport>> = Arc::new(Dispatcher::new());
        let mut light = MochadLight::new(dispatcher, &config("c5", BrightnessLevels::Levels32));

        light.turn_on(Some(50)).await;
        assert!(light.is_on());
        assert_eq!(light.brightness(), 50);
        assert!(!light.device_status().await);

        light.turn_off().await;
        assert!(!light.is_on());
    }

    // ========================================================================
    // Status and raw commands
    // ========================================================================

    #[tokio::test]
    async fn device_status_parses_dump() {
        let transport = RecordingTransport::new();
        transport.push_reply("01/01 00:00:00 Device status\n01/01 00:00:00 House A: 1=1\n");
        transport.push_reply("01/01 00:00:00 End status\n");
        let light = light(&transport, BrightnessLevels::Levels32);

        assert!(light.device_status().await);
        assert_eq!(transport.commands(), vec!["st"]);
    }

    #[tokio::test]
    async fn device_status_is_off_when_send_fails() {
        let transport = RecordingTransport::failing();
        let light = light(&transport, BrightnessLevels::Levels32);

        assert!(!light.device_status().await);
    }

    #[tokio::test]
    async fn send_cmd_does_not_touch_state() {
        let transport = RecordingTransport::new();
        let light = light(&transport, BrightnessLevels::Levels32);

        light.send_cmd(X10Command::Bright(3)).await;

        assert_eq!(transport.lines(), vec!["pl a1 bright 3"]);
        assert!(!light.is_on());
    }

    // ========================================================================
    // Mutual exclusion
    // ========================================================================

    #[tokio::test]
    async fn concurrent_sequences_do_not_interleave() {
        let transport = RecordingTransport::new();
        let dispatcher = Arc::new(Dispatcher::with_transport(transport.clone()));
        let mut a1 = MochadLight::new(
            Arc::clone(&dispatcher),
            &config("a1", BrightnessLevels::Levels32),
        );
        let mut b2 = MochadLight::new(
            Arc::clone(&dispatcher),
            &config("b2", BrightnessLevels::Levels32),
        );

        tokio::join!(a1.turn_on(Some(128)), b2.turn_on(Some(64)));

        let a_seq = vec!["pl a1 on", FLUSH, "pl a1 dim 15", FLUSH];
        let b_seq = vec!["pl b2 on", FLUSH, "pl b2 dim 23", FLUSH];
        let lines = transport.lines();

        let a_then_b: Vec<&str> = a_seq.iter().chain(&b_seq).copied().collect();
        let b_then_a: Vec<&str> = b_seq.iter().chain(&a_seq).copied().collect();
        assert!(
            lines == a_then_b || lines == b_then_a,
            "sequences interleaved: {lines:?}"
        );
    }
}
