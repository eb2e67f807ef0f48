bitflags::bitflags! {
    /// Which dictionaries have completed loading, independent of the
    /// order they arrive in (SPEC_FULL.md §11 "Dictionary-state flags").
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DictionaryState: u8 {
        const NONE = 0;
        const HAVE_FIELD_DICT = 1 << 0;
        const HAVE_ENUM_DICT = 1 << 1;
    }
}

/// Post-`Active` application handshake FSM (spec.md §4.L): login, source
/// directory, and the two dictionaries must complete, in that order for
/// login/directory, before the session is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Init,
    LoginSent,
    LoggedIn,
    DirectorySent,
    HaveDirectory,
    HaveFieldDict,
    HaveEnumDict,
    Ready,
}

/// Events that drive `ReadyState` transitions. Named after the message
/// that triggers them rather than the state reached, matching the way
/// spec.md §4.L describes the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyEvent {
    ChannelActive,
    LoginRefreshReceived,
    /// `provides_both_dictionaries` reflects the advertised service's
    /// `ServiceInfo::provides_both_dictionaries()` (spec.md §4.L
    /// "advertises both RWFFld and RWFEnum"); `true` when the directory
    /// payload carried no service list at all, so a session built without
    /// one still runs the full dictionary handshake unchanged.
    DirectoryRefreshReceived { provides_both_dictionaries: bool },
    FieldDictionaryComplete,
    EnumDictionaryComplete,
}

#[derive(Debug)]
pub struct ReadinessTracker {
    state: ReadyState,
    dictionaries: DictionaryState,
    /// Auto-dictionary-download policy (spec.md §4.L "else proceed to
    /// READY"): when `false`, the session skips waiting on the two
    /// dictionary-complete events entirely once the directory arrives.
    download_dictionaries: bool,
}

impl Default for ReadinessTracker {
    fn default() -> Self {
        Self::with_policy(true)
    }
}

impl ReadinessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tracker with an explicit auto-dictionary-download policy
    /// (spec.md §4.L, SPEC_FULL.md §6 `-downloadDictionaries`).
    pub fn with_policy(download_dictionaries: bool) -> Self {
        ReadinessTracker {
            state: ReadyState::Init,
            dictionaries: DictionaryState::NONE,
            download_dictionaries,
        }
    }

    pub fn state(&self) -> ReadyState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ReadyState::Ready
    }

    /// Applies one event, returning `true` if this call is the one that
    /// reached `Ready` (the point at which `CHANNEL_READY` is synthesized
    /// for the consuming application, per spec.md §4.L).
    pub fn apply(&mut self, event: ReadyEvent) -> bool {
        use ReadyEvent::*;
        use ReadyState::*;

        match (self.state, event) {
            (Init, ChannelActive) => self.state = LoginSent,
            (LoginSent, LoginRefreshReceived) => {
                // LoggedIn is momentary: the directory request is fired
                // automatically the instant login completes, so there is
                // no distinct wire event that parks us in LoggedIn.
                self.state = LoggedIn;
                self.state = DirectorySent;
            }
            (DirectorySent, DirectoryRefreshReceived { provides_both_dictionaries }) => {
                self.state = HaveDirectory;
                if !self.download_dictionaries || !provides_both_dictionaries {
                    // No dictionary exchange will ever complete: either
                    // auto-download is off, or the service never advertised
                    // both names, so waiting here would block forever.
                    self.state = Ready;
                }
            }
            (HaveDirectory, FieldDictionaryComplete) | (HaveEnumDict, FieldDictionaryComplete) => {
                self.dictionaries.insert(DictionaryState::HAVE_FIELD_DICT);
                self.try_finish();
            }
            (HaveDirectory, EnumDictionaryComplete) | (HaveFieldDict, EnumDictionaryComplete) => {
                self.dictionaries.insert(DictionaryState::HAVE_ENUM_DICT);
                self.try_finish();
            }
            _ => {}
        }
        self.state == Ready
    }

    fn try_finish(&mut self) {
        use ReadyState::*;
        let have_field = self.dictionaries.contains(DictionaryState::HAVE_FIELD_DICT);
        let have_enum = self.dictionaries.contains(DictionaryState::HAVE_ENUM_DICT);
        match self.state {
            HaveDirectory if have_field && have_enum => self.state = Ready,
            HaveDirectory if have_field => self.state = HaveFieldDict,
            HaveDirectory if have_enum => self.state = HaveEnumDict,
            HaveFieldDict if have_enum => self.state = Ready,
            HaveEnumDict if have_field => self.state = Ready,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_handshake_reaches_ready_once_both_dictionaries_complete() {
        let mut t = ReadinessTracker::new();
        assert!(!t.apply(ReadyEvent::ChannelActive));
        assert!(!t.apply(ReadyEvent::LoginRefreshReceived));
        assert!(!t.apply(ReadyEvent::DirectoryRefreshReceived { provides_both_dictionaries: true }));
        assert_eq!(t.state(), ReadyState::HaveDirectory);
        assert!(!t.apply(ReadyEvent::FieldDictionaryComplete));
        assert_eq!(t.state(), ReadyState::HaveFieldDict);
        assert!(t.apply(ReadyEvent::EnumDictionaryComplete));
        assert!(t.is_ready());
    }

    #[test]
    fn dictionary_order_is_order_independent() {
        let mut t = ReadinessTracker::new();
        t.apply(ReadyEvent::ChannelActive);
        t.apply(ReadyEvent::LoginRefreshReceived);
        t.apply(ReadyEvent::DirectoryRefreshReceived { provides_both_dictionaries: true });
        t.apply(ReadyEvent::EnumDictionaryComplete);
        assert_eq!(t.state(), ReadyState::HaveEnumDict);
        assert!(t.apply(ReadyEvent::FieldDictionaryComplete));
        assert!(t.is_ready());
    }

    #[test]
    fn auto_download_disabled_reaches_ready_straight_from_directory() {
        let mut t = ReadinessTracker::with_policy(false);
        t.apply(ReadyEvent::ChannelActive);
        t.apply(ReadyEvent::LoginRefreshReceived);
        assert!(t.apply(ReadyEvent::DirectoryRefreshReceived { provides_both_dictionaries: true }));
        assert!(t.is_ready());
    }

    #[test]
    fn service_missing_a_dictionary_reaches_ready_without_waiting() {
        let mut t = ReadinessTracker::new();
        t.apply(ReadyEvent::ChannelActive);
        t.apply(ReadyEvent::LoginRefreshReceived);
        assert!(t.apply(ReadyEvent::DirectoryRefreshReceived { provides_both_dictionaries: false }));
        assert!(t.is_ready());
    }
}
