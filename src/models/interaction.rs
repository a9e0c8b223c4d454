use super::SubscriptionKey;

/// Зачем пользователь прислал ссылку на спектакль.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetIntent {
    Find,
    Monitor,
}

/// Состояние диалога с одним чатом. Живёт только в памяти бота.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    AwaitingTarget { intent: TargetIntent },
    AwaitingMinRun { target: String, source_url: String },
    AwaitingRowCeiling { target: String, source_url: String, min_run: u32 },
    AwaitingNewRowCeiling { key: SubscriptionKey },
}

impl InteractionState {
    /// Ждём ли мы от пользователя ввода (а не команды из меню).
    pub fn is_awaiting_input(&self) -> bool {
        !matches!(self, InteractionState::Idle)
    }
}
