use crate::app::InputPurpose;

/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    /// Close the topmost overlay, or leave the block view
    GoBack,

    // UI toggles
    ToggleHelp,
    ToggleRules,
    ToggleBlockView,

    // Log view scrolling
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollToTop,
    ScrollToBottom,
    PageUp,
    PageDown,
    ToggleAutoScroll,

    // Monitoring
    TogglePause,
    Reload,
    CycleFilterMode,
    RequestClear,
    ConfirmYes,
    ConfirmNo,

    // Output
    ExportContent,
    CombineLogs,
    /// Show the wp-content directory in the file manager
    OpenFolder,

    // Block view
    BlockUp,
    BlockDown,
    BlockToggle,
    BlockSelectAll,
    BlockDeselectAll,
    ExportSelected,

    // Rules overlay
    RuleUp,
    RuleDown,
    RemoveRule,
    ClearRules,

    // Text input prompt
    OpenInput(InputPurpose),
    InputChar(char),
    InputBackspace,
    InputClear,
    InputSubmit,
    InputCancel,

    /// Attention flash toggle from the title flasher
    Flash(bool),
}
