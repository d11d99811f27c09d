use autocore::{Trigger, TriggerType, TriggerVariable};

/// Descriptor for one of the platform's business events
pub struct EventTrigger {
    trigger_type: TriggerType,
}

impl EventTrigger {
    pub fn new(trigger_type: TriggerType) -> Self {
        Self { trigger_type }
    }

    pub fn trigger_type(&self) -> TriggerType {
        self.trigger_type
    }
}

impl Trigger for EventTrigger {
    fn id(&self) -> &str {
        self.trigger_type.as_str()
    }

    fn name(&self) -> &str {
        match self.trigger_type {
            TriggerType::BookingCreated => "Booking created",
            TriggerType::BookingConfirmed => "Booking confirmed",
            TriggerType::BookingCancelled => "Booking cancelled",
            TriggerType::BookingReminder => "Booking reminder",
            TriggerType::EventCreated => "Event created",
            TriggerType::EventUpdated => "Event updated",
            TriggerType::EventDeleted => "Event deleted",
        }
    }

    fn description(&self) -> &str {
        match self.trigger_type {
            TriggerType::BookingCreated => "A guest booked a slot",
            TriggerType::BookingConfirmed => "A pending booking was confirmed",
            TriggerType::BookingCancelled => "A booking was cancelled by the guest or host",
            TriggerType::BookingReminder => "A booking is about to start",
            TriggerType::EventCreated => "A bookable event type was created",
            TriggerType::EventUpdated => "A bookable event type was changed",
            TriggerType::EventDeleted => "A bookable event type was removed",
        }
    }

    fn category(&self) -> &str {
        match self.trigger_type {
            TriggerType::BookingCreated
            | TriggerType::BookingConfirmed
            | TriggerType::BookingCancelled
            | TriggerType::BookingReminder => "booking",
            TriggerType::EventCreated | TriggerType::EventUpdated | TriggerType::EventDeleted => {
                "event"
            }
        }
    }

    fn variables(&self) -> Vec<TriggerVariable> {
        let mut variables = vec![
            TriggerVariable::new("event.id", "Event type identifier"),
            TriggerVariable::new("event.title", "Event type title"),
            TriggerVariable::new("organization.id", "Owning organization"),
        ];
        match self.trigger_type {
            TriggerType::BookingCreated
            | TriggerType::BookingConfirmed
            | TriggerType::BookingCancelled
            | TriggerType::BookingReminder => {
                variables.extend([
                    TriggerVariable::new("booking.id", "Booking identifier"),
                    TriggerVariable::new("booking.status", "pending, confirmed or cancelled"),
                    TriggerVariable::new("booking.start_time", "Start of the booked slot (RFC 3339)"),
                    TriggerVariable::new("booking.end_time", "End of the booked slot (RFC 3339)"),
                    TriggerVariable::new("booking.attendee.name", "Guest name"),
                    TriggerVariable::new("booking.attendee.email", "Guest email address"),
                ]);
            }
            TriggerType::EventCreated | TriggerType::EventUpdated | TriggerType::EventDeleted => {
                variables.push(TriggerVariable::new("event.duration", "Slot length in minutes"));
            }
        }
        match self.trigger_type {
            TriggerType::BookingCancelled => variables.push(TriggerVariable::new(
                "booking.cancellation_reason",
                "Reason given when cancelling",
            )),
            TriggerType::BookingReminder => variables.push(TriggerVariable::new(
                "reminder.minutes_before",
                "Minutes until the booking starts",
            )),
            _ => {}
        }
        variables
    }
}
