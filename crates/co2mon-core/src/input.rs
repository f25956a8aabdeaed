//! Debounced push buttons and the actions they trigger
//!
//! Each button gets its own [`InputPoller`]: the pin is sampled on a fixed
//! period, a [`Debouncer`] turns raw samples into confirmed presses, and a
//! [`ButtonAction`] runs once per press. Buttons are wired active-low with
//! pull-ups, so a low level means pressed.

use embassy_time::{Duration, Instant, Ticker};
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, info, warn};

use crate::app_state::{LockTimeout, MonitorContext};
use crate::config::MAX_SCREENS;
use crate::ui::{Screen, UiLock, Widgets};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// Pin released, waiting for a press
    Released,
    /// Pin asserted since `since`, not yet confirmed
    PressDebounce { since: Instant },
    /// Waiting for the pin to be released, either after a confirmed press
    /// or at startup before the first released sample
    AwaitRelease,
}

/// Press detector for a sampled button.
///
/// A press is confirmed once the button has read asserted on every sample
/// for at least the debounce window. Any released sample before that point
/// discards the candidate press. Only a release-to-press edge arms the
/// debouncer, so a button already held when polling starts never counts.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    window: Duration,
    state: DebounceState,
}

impl Debouncer {
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            state: DebounceState::AwaitRelease,
        }
    }

    pub const fn state(&self) -> DebounceState {
        self.state
    }

    /// Feed one sample taken at `now`. Returns `true` exactly once per
    /// confirmed press.
    pub fn poll(&mut self, asserted: bool, now: Instant) -> bool {
        match (self.state, asserted) {
            (DebounceState::Released, true) => {
                self.state = DebounceState::PressDebounce { since: now };
                false
            }
            (DebounceState::PressDebounce { .. }, false) | (DebounceState::AwaitRelease, false) => {
                self.state = DebounceState::Released;
                false
            }
            (DebounceState::PressDebounce { since }, true) => {
                if now.saturating_duration_since(since) >= self.window {
                    self.state = DebounceState::AwaitRelease;
                    true
                } else {
                    false
                }
            }
            (DebounceState::Released, false) | (DebounceState::AwaitRelease, true) => false,
        }
    }
}

/// Work done once per confirmed press.
pub trait ButtonAction {
    fn on_press(&mut self) -> impl Future<Output = ()>;
}

/// Backlight enable pin plus its current state. High means on.
pub struct Backlight<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> Backlight<P> {
    /// Take over the pin and switch the backlight on.
    pub fn new(mut pin: P) -> Result<Self, P::Error> {
        pin.set_high()?;
        Ok(Self { pin, on: true })
    }

    pub const fn is_on(&self) -> bool {
        self.on
    }

    /// Flip the backlight and return the new state.
    pub fn toggle(&mut self) -> Result<bool, P::Error> {
        if self.on {
            self.pin.set_low()?;
        } else {
            self.pin.set_high()?;
        }
        self.on = !self.on;
        Ok(self.on)
    }
}

impl<P: OutputPin> ButtonAction for Backlight<P> {
    async fn on_press(&mut self) {
        match self.toggle() {
            Ok(on) => info!("Backlight {}", if on { "on" } else { "off" }),
            Err(e) => warn!("Failed to switch backlight: {:?}", e),
        }
    }
}

/// Screen index cycled by the next-screen button.
pub struct ScreenSelector<'a, W> {
    ui: &'a UiLock<W>,
    index: usize,
    count: usize,
    swap_timeout: Duration,
}

impl<'a, W: Widgets> ScreenSelector<'a, W> {
    pub fn new(ui: &'a UiLock<W>, count: usize, swap_timeout: Duration) -> Self {
        Self {
            ui,
            index: 0,
            count: count.clamp(1, MAX_SCREENS),
            swap_timeout,
        }
    }

    pub fn from_context<const N: usize>(ctx: &'a MonitorContext<W, N>) -> Self {
        Self::new(
            &ctx.ui,
            ctx.config.screen_count,
            ctx.config.screen_swap_lock_timeout,
        )
    }

    pub const fn index(&self) -> usize {
        self.index
    }

    pub fn screen(&self) -> Screen {
        Screen::from_index(self.index)
    }

    /// Advance to the next screen and load it.
    ///
    /// The index advances even when the UI lock cannot be taken, so the
    /// following press moves on from the new index.
    pub async fn advance(&mut self) -> Result<Screen, LockTimeout> {
        self.index = (self.index + 1) % self.count;
        let screen = self.screen();

        let mut ui = self.ui.acquire_exclusive(self.swap_timeout).await?;
        if let Err(e) = ui.load_screen(screen) {
            warn!("Failed to draw {:?}: {:?}", screen, e);
        }
        Ok(screen)
    }
}

impl<W: Widgets> ButtonAction for ScreenSelector<'_, W> {
    async fn on_press(&mut self) {
        match self.advance().await {
            Ok(screen) => info!("Switched to {}", screen.title()),
            Err(e) => warn!("Screen swap skipped: {}", e),
        }
    }
}

/// Samples one active-low button and runs its action per confirmed press.
pub struct InputPoller<P, A> {
    pin: P,
    debouncer: Debouncer,
    action: A,
    poll_period: Duration,
}

impl<P: InputPin, A: ButtonAction> InputPoller<P, A> {
    pub const fn new(pin: P, action: A, debounce: Duration, poll_period: Duration) -> Self {
        Self {
            pin,
            debouncer: Debouncer::new(debounce),
            action,
            poll_period,
        }
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    pub fn debounce_state(&self) -> DebounceState {
        self.debouncer.state()
    }

    /// Sample the pin once at `now`. Returns `true` if the action ran.
    ///
    /// A failed read is skipped and leaves the debouncer untouched.
    pub async fn poll_once(&mut self, now: Instant) -> bool {
        let asserted = match self.pin.is_low() {
            Ok(low) => low,
            Err(e) => {
                debug!("Button read failed: {:?}", e);
                return false;
            }
        };

        if self.debouncer.poll(asserted, now) {
            self.action.on_press().await;
            true
        } else {
            false
        }
    }

    pub async fn run(&mut self) -> ! {
        let mut ticker = Ticker::every(self.poll_period);
        loop {
            self.poll_once(Instant::now()).await;
            ticker.next().await;
        }
    }
}
