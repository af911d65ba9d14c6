use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::{Action, InputPurpose};

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    LogViewer,
    BlockPicker,
    Rules,
    TextInput,
    Confirm,
}

impl KeyContext {
    /// Modal contexts swallow keys instead of falling back to global bindings
    fn is_modal(&self) -> bool {
        matches!(self, Self::TextInput | Self::Confirm)
    }
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Esc), Action::GoBack);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('p')), Action::TogglePause);
        global.insert(KeyBinding::new(KeyCode::Char('r')), Action::Reload);
        global.insert(KeyBinding::new(KeyCode::Char('b')), Action::ToggleBlockView);
        global.insert(KeyBinding::new(KeyCode::Char('x')), Action::ToggleRules);
        global.insert(KeyBinding::shift(KeyCode::Char('M')), Action::CycleFilterMode);
        global.insert(KeyBinding::new(KeyCode::Char('m')), Action::CombineLogs);
        global.insert(
            KeyBinding::new(KeyCode::Char('o')),
            Action::OpenInput(InputPurpose::LogSource),
        );
        global.insert(
            KeyBinding::new(KeyCode::Char('l')),
            Action::OpenInput(InputPurpose::ConsoleDirectory),
        );
        global.insert(KeyBinding::shift(KeyCode::Char('O')), Action::OpenFolder);
        bindings.insert(KeyContext::Global, global);

        // Log viewer bindings - less-like navigation
        let mut log_viewer = HashMap::new();
        log_viewer.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        log_viewer.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        log_viewer.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        log_viewer.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('f')), Action::ToggleAutoScroll);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('e')), Action::ExportContent);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('c')), Action::RequestClear);
        log_viewer.insert(
            KeyBinding::new(KeyCode::Char('a')),
            Action::OpenInput(InputPurpose::AddRule),
        );
        bindings.insert(KeyContext::LogViewer, log_viewer);

        // Block picker bindings
        let mut blocks = HashMap::new();
        blocks.insert(KeyBinding::new(KeyCode::Char('j')), Action::BlockDown);
        blocks.insert(KeyBinding::new(KeyCode::Down), Action::BlockDown);
        blocks.insert(KeyBinding::new(KeyCode::Char('k')), Action::BlockUp);
        blocks.insert(KeyBinding::new(KeyCode::Up), Action::BlockUp);
        blocks.insert(KeyBinding::new(KeyCode::Char(' ')), Action::BlockToggle);
        blocks.insert(KeyBinding::new(KeyCode::Char('a')), Action::BlockSelectAll);
        blocks.insert(KeyBinding::new(KeyCode::Char('n')), Action::BlockDeselectAll);
        blocks.insert(KeyBinding::new(KeyCode::Char('e')), Action::ExportSelected);
        blocks.insert(KeyBinding::new(KeyCode::Enter), Action::ExportSelected);
        bindings.insert(KeyContext::BlockPicker, blocks);

        // Rules overlay bindings
        let mut rules = HashMap::new();
        rules.insert(KeyBinding::new(KeyCode::Char('j')), Action::RuleDown);
        rules.insert(KeyBinding::new(KeyCode::Down), Action::RuleDown);
        rules.insert(KeyBinding::new(KeyCode::Char('k')), Action::RuleUp);
        rules.insert(KeyBinding::new(KeyCode::Up), Action::RuleUp);
        rules.insert(KeyBinding::new(KeyCode::Char('d')), Action::RemoveRule);
        rules.insert(KeyBinding::new(KeyCode::Delete), Action::RemoveRule);
        rules.insert(KeyBinding::shift(KeyCode::Char('X')), Action::ClearRules);
        rules.insert(
            KeyBinding::new(KeyCode::Char('a')),
            Action::OpenInput(InputPurpose::AddRule),
        );
        bindings.insert(KeyContext::Rules, rules);

        // Text prompt bindings
        let mut input = HashMap::new();
        input.insert(KeyBinding::new(KeyCode::Enter), Action::InputSubmit);
        input.insert(KeyBinding::new(KeyCode::Esc), Action::InputCancel);
        input.insert(KeyBinding::new(KeyCode::Backspace), Action::InputBackspace);
        input.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::InputClear);
        input.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::InputCancel);
        bindings.insert(KeyContext::TextInput, input);

        // Confirmation bindings
        let mut confirm = HashMap::new();
        confirm.insert(KeyBinding::new(KeyCode::Char('y')), Action::ConfirmYes);
        confirm.insert(KeyBinding::new(KeyCode::Enter), Action::ConfirmYes);
        confirm.insert(KeyBinding::new(KeyCode::Char('n')), Action::ConfirmNo);
        confirm.insert(KeyBinding::new(KeyCode::Esc), Action::ConfirmNo);
        bindings.insert(KeyContext::Confirm, confirm);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(action) = self
            .bindings
            .get(&context)
            .and_then(|bindings| bindings.get(&binding))
        {
            return Some(action.clone());
        }

        if context == KeyContext::TextInput {
            // For regular characters, return InputChar action
            if let KeyCode::Char(c) = key.code {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    return Some(Action::InputChar(c));
                }
            }
        }

        if context.is_modal() {
            return None;
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_context_binding_wins_over_global() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.get_action(KeyContext::BlockPicker, &key(KeyCode::Char('a'))),
            Some(Action::BlockSelectAll)
        );
        assert_eq!(
            bindings.get_action(KeyContext::LogViewer, &key(KeyCode::Char('a'))),
            Some(Action::OpenInput(InputPurpose::AddRule))
        );
    }

    #[test]
    fn test_global_fallback() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.get_action(KeyContext::BlockPicker, &key(KeyCode::Char('q'))),
            Some(Action::Quit)
        );
        assert_eq!(
            bindings.get_action(KeyContext::Rules, &key(KeyCode::Char('p'))),
            Some(Action::TogglePause)
        );
    }

    #[test]
    fn test_text_input_captures_characters() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.get_action(KeyContext::TextInput, &key(KeyCode::Char('q'))),
            Some(Action::InputChar('q'))
        );
        assert_eq!(
            bindings.get_action(
                KeyContext::TextInput,
                &KeyEvent::new(KeyCode::Char('D'), KeyModifiers::SHIFT)
            ),
            Some(Action::InputChar('D'))
        );
        assert_eq!(
            bindings.get_action(KeyContext::TextInput, &key(KeyCode::Enter)),
            Some(Action::InputSubmit)
        );
        assert_eq!(
            bindings.get_action(KeyContext::TextInput, &key(KeyCode::Tab)),
            None
        );
    }

    #[test]
    fn test_confirm_is_modal() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.get_action(KeyContext::Confirm, &key(KeyCode::Char('y'))),
            Some(Action::ConfirmYes)
        );
        assert_eq!(
            bindings.get_action(KeyContext::Confirm, &key(KeyCode::Char('q'))),
            None
        );
    }

    #[test]
    fn test_shift_bindings() {
        let bindings = KeyBindings::new();
        let shift_m = KeyEvent::new(KeyCode::Char('M'), KeyModifiers::SHIFT);
        assert_eq!(
            bindings.get_action(KeyContext::LogViewer, &shift_m),
            Some(Action::CycleFilterMode)
        );
        let shift_o = KeyEvent::new(KeyCode::Char('O'), KeyModifiers::SHIFT);
        assert_eq!(
            bindings.get_action(KeyContext::BlockPicker, &shift_o),
            Some(Action::OpenFolder)
        );
    }
}
