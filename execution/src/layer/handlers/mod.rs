use super::*;
use dicehouse_types::execution::rejection_message;

pub(super) fn bet_rejected(public: &PublicKey, error: &BetError) -> Event {
    Event::BetRejected {
        public: public.clone(),
        error_code: error.code(),
        message: rejection_message(&error.to_string()).to_string(),
    }
}

mod dice;
