//! Registration and event lifecycle rules
//!
//! Pure functions only: no storage, no clock. Services call these before
//! issuing the compare-and-set write that persists the change.

use uuid::Uuid;
use crate::models::event::{Event, EventStatus};
use crate::models::registration::{Registration, RegistrationStatus, PaymentStatus};
use crate::utils::errors::{EventHubError, Result};

/// How the acting user relates to a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Organizer,
    Attendee,
}

/// Resolve the actor's relation to a registration, or `Forbidden`
pub fn party_of(actor_id: Uuid, event_organizer_id: Uuid, attendee_id: Uuid) -> Result<Party> {
    if actor_id == event_organizer_id {
        Ok(Party::Organizer)
    } else if actor_id == attendee_id {
        Ok(Party::Attendee)
    } else {
        Err(EventHubError::Forbidden(
            "Only the event organizer or the attendee can change this registration".to_string(),
        ))
    }
}

/// Check that `party` may move a registration from `from` to `to`
pub fn check_transition(from: RegistrationStatus, to: RegistrationStatus, party: Party) -> Result<()> {
    use RegistrationStatus::*;

    match (from, to, party) {
        (Pending, Confirmed, Party::Organizer) => Ok(()),
        (Pending, Confirmed, Party::Attendee) => Err(EventHubError::Forbidden(
            "Only the event organizer can confirm a registration".to_string(),
        )),
        (Pending, Cancelled, _) => Ok(()),
        (Confirmed, Cancelled, Party::Attendee) => Ok(()),
        (Confirmed, Cancelled, Party::Organizer) => Err(EventHubError::Forbidden(
            "A confirmed registration can only be cancelled by the attendee".to_string(),
        )),
        _ => Err(invalid_transition(from, to)),
    }
}

pub fn invalid_transition(from: RegistrationStatus, to: RegistrationStatus) -> EventHubError {
    EventHubError::InvalidStateTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}

/// Status a new registration starts in
pub fn initial_status(requires_approval: bool) -> RegistrationStatus {
    if requires_approval {
        RegistrationStatus::Pending
    } else {
        RegistrationStatus::Confirmed
    }
}

/// Payment status a new registration starts in
pub fn initial_payment_status(is_free: bool) -> PaymentStatus {
    if is_free {
        PaymentStatus::NotRequired
    } else {
        PaymentStatus::Unpaid
    }
}

/// Check that `actor_id` may pay for `registration` right now
pub fn check_payable(registration: &Registration, actor_id: Uuid) -> Result<()> {
    if registration.attendee_id != actor_id {
        return Err(EventHubError::Forbidden(
            "Only the attendee can pay for this registration".to_string(),
        ));
    }

    match registration.payment_status {
        PaymentStatus::Paid => {
            return Err(EventHubError::Conflict("Registration is already paid".to_string()));
        }
        PaymentStatus::NotRequired => {
            return Err(EventHubError::InvalidState(
                "Payment is not required for a free event".to_string(),
            ));
        }
        PaymentStatus::Processing => {
            return Err(EventHubError::Conflict("A payment for this registration is in progress".to_string()));
        }
        PaymentStatus::Unpaid => {}
    }

    if !registration.awaiting_payment() {
        return Err(EventHubError::InvalidState(format!(
            "Registration must be CONFIRMED to be paid, it is {}",
            registration.status
        )));
    }

    Ok(())
}

/// Check that `actor_id` may publish `event`
pub fn check_publish(event: &Event, actor_id: Uuid) -> Result<()> {
    if !event.is_owned_by(actor_id) {
        return Err(EventHubError::Forbidden(
            "Only the event organizer can publish this event".to_string(),
        ));
    }

    if event.status != EventStatus::Draft {
        return Err(EventHubError::InvalidStateTransition {
            from: event.status.to_string(),
            to: EventStatus::Published.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use proptest::prelude::*;
    use tokio_test::assert_ok;
    use RegistrationStatus::*;

    fn registration(status: RegistrationStatus, payment_status: PaymentStatus) -> Registration {
        let now = Utc::now();
        Registration {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            attendee_id: Uuid::new_v4(),
            ticket_type: "General".to_string(),
            quantity: 1,
            total_price_cents: 2500,
            currency: "EUR".to_string(),
            status,
            payment_status,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_party_resolution() {
        let organizer = Uuid::new_v4();
        let attendee = Uuid::new_v4();
        assert_eq!(party_of(organizer, organizer, attendee).unwrap(), Party::Organizer);
        assert_eq!(party_of(attendee, organizer, attendee).unwrap(), Party::Attendee);
        assert_matches!(party_of(Uuid::new_v4(), organizer, attendee), Err(EventHubError::Forbidden(_)));
    }

    #[test]
    fn test_transition_table() {
        assert_ok!(check_transition(Pending, Confirmed, Party::Organizer));
        assert_ok!(check_transition(Pending, Cancelled, Party::Organizer));
        assert_ok!(check_transition(Pending, Cancelled, Party::Attendee));
        assert_ok!(check_transition(Confirmed, Cancelled, Party::Attendee));

        assert_matches!(check_transition(Pending, Confirmed, Party::Attendee), Err(EventHubError::Forbidden(_)));
        assert_matches!(check_transition(Confirmed, Cancelled, Party::Organizer), Err(EventHubError::Forbidden(_)));
        assert_matches!(
            check_transition(Confirmed, Pending, Party::Organizer),
            Err(EventHubError::InvalidStateTransition { .. })
        );
        assert_matches!(
            check_transition(Cancelled, Confirmed, Party::Organizer),
            Err(EventHubError::InvalidStateTransition { .. })
        );
    }

    #[test]
    fn test_initial_statuses() {
        assert_eq!(initial_status(true), Pending);
        assert_eq!(initial_status(false), Confirmed);
        assert_eq!(initial_payment_status(true), PaymentStatus::NotRequired);
        assert_eq!(initial_payment_status(false), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_payable() {
        let reg = registration(Confirmed, PaymentStatus::Unpaid);
        assert!(check_payable(&reg, reg.attendee_id).is_ok());
        assert_matches!(check_payable(&reg, Uuid::new_v4()), Err(EventHubError::Forbidden(_)));

        let pending = registration(Pending, PaymentStatus::Unpaid);
        assert_matches!(check_payable(&pending, pending.attendee_id), Err(EventHubError::InvalidState(_)));

        let free = registration(Confirmed, PaymentStatus::NotRequired);
        assert_matches!(check_payable(&free, free.attendee_id), Err(EventHubError::InvalidState(_)));

        let paid = registration(Confirmed, PaymentStatus::Paid);
        assert_matches!(check_payable(&paid, paid.attendee_id), Err(EventHubError::Conflict(_)));

        let in_flight = registration(Confirmed, PaymentStatus::Processing);
        assert_matches!(check_payable(&in_flight, in_flight.attendee_id), Err(EventHubError::Conflict(_)));

        let cancelled = registration(Cancelled, PaymentStatus::Unpaid);
        assert_matches!(check_payable(&cancelled, cancelled.attendee_id), Err(EventHubError::InvalidState(_)));
    }

    fn any_status() -> impl Strategy<Value = RegistrationStatus> {
        proptest::sample::select(RegistrationStatus::ALL.to_vec())
    }

    fn any_party() -> impl Strategy<Value = Party> {
        prop_oneof![Just(Party::Organizer), Just(Party::Attendee)]
    }

    proptest! {
        #[test]
        fn cancelled_is_terminal(to in any_status(), party in any_party()) {
            prop_assert!(check_transition(Cancelled, to, party).is_err());
        }

        #[test]
        fn nothing_returns_to_pending(from in any_status(), party in any_party()) {
            prop_assert!(check_transition(from, Pending, party).is_err());
        }

        #[test]
        fn self_transitions_are_rejected(status in any_status(), party in any_party()) {
            let is_invalid_transition = matches!(
                check_transition(status, status, party),
                Err(EventHubError::InvalidStateTransition { .. })
            );
            prop_assert!(is_invalid_transition);
        }

        #[test]
        fn exactly_one_party_may_confirm(party in any_party()) {
            prop_assert_eq!(check_transition(Pending, Confirmed, party).is_ok(), party == Party::Organizer);
        }
    }
}
