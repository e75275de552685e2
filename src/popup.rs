//! Settings Popup
//!
//! One checkbox per flag. Every change is saved and pushed to open
//! GitLab tabs right away.

use board_engine::Flags;
use leptos::prelude::*;
use leptos::task::spawn_local;
use reactive_stores::Store;
use tracing::{debug, warn};

use crate::browser;
use crate::error::ExtensionError;

pub struct FlagOption {
    pub id: &'static str,
    pub label: &'static str,
    pub get: fn(&Flags) -> bool,
    pub set: fn(&mut Flags, bool),
}

/// Checkbox ids and labels, in display order
pub const FLAG_OPTIONS: &[FlagOption] = &[
    FlagOption {
        id: "flag-group-children",
        label: "Group tasks under their issue",
        get: |f| f.group_children,
        set: |f, v| f.group_children = v,
    },
    FlagOption {
        id: "flag-highlight-in-progress",
        label: "Highlight in-progress items",
        get: |f| f.highlight_in_progress,
        set: |f, v| f.highlight_in_progress = v,
    },
    FlagOption {
        id: "flag-highlight-in-review",
        label: "Highlight items in review",
        get: |f| f.highlight_in_review,
        set: |f, v| f.highlight_in_review = v,
    },
    FlagOption {
        id: "flag-mute-done",
        label: "Mute done items",
        get: |f| f.mute_done,
        set: |f, v| f.mute_done = v,
    },
    FlagOption {
        id: "flag-separate-task-counts",
        label: "Count tasks separately",
        get: |f| f.separate_task_counts,
        set: |f, v| f.separate_task_counts = v,
    },
    FlagOption {
        id: "flag-in-review-board",
        label: "Show an \"In review\" column",
        get: |f| f.in_review_board,
        set: |f, v| f.in_review_board = v,
    },
];

/// Popup state with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct PopupState {
    pub flags: Flags,
    /// Set once stored flags have been read
    pub loaded: bool,
    pub last_error: Option<String>,
}

async fn persist_and_broadcast(flags: Flags) -> Result<usize, ExtensionError> {
    browser::save_flags(flags).await?;
    browser::broadcast_flags(flags).await
}

#[component]
pub fn SettingsPanel() -> impl IntoView {
    let state = Store::new(PopupState::default());

    Effect::new(move |_| {
        spawn_local(async move {
            match browser::load_flags().await {
                Ok(flags) => state.flags().set(flags),
                Err(e) => {
                    warn!("could not load flags: {}", e);
                    state.last_error().set(Some(e.to_string()));
                }
            }
            state.loaded().set(true);
        });
    });

    let on_toggle = move |option: &'static FlagOption, checked: bool| {
        state.flags().update(|flags| (option.set)(flags, checked));
        let flags = state.flags().get_untracked();
        spawn_local(async move {
            match persist_and_broadcast(flags).await {
                Ok(tabs) => {
                    debug!("{} saved, sent to {} tab(s)", option.id, tabs);
                    state.last_error().set(None);
                }
                Err(e) => {
                    warn!("could not save flags: {}", e);
                    state.last_error().set(Some(e.to_string()));
                }
            }
        });
    };

    view! {
        <div class="settings">
            <h1 class="settings-title">"Milestone Lens"</h1>
            {FLAG_OPTIONS.iter().map(|option| {
                view! {
                    <label class="flag-option" for=option.id>
                        <input
                            type="checkbox"
                            id=option.id
                            disabled=move || !state.loaded().get()
                            prop:checked=move || (option.get)(&state.flags().get())
                            on:change=move |ev| on_toggle(option, event_target_checked(&ev))
                        />
                        {option.label}
                    </label>
                }
            }).collect_view()}
            <Show when=move || state.last_error().get().is_some()>
                <p class="settings-error">{move || state.last_error().get().unwrap_or_default()}</p>
            </Show>
        </div>
    }
}
