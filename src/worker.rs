//! Runs calendar source requests off the UI thread.  Jobs are executed one
//! at a time in the order received; results come back as dashboard messages.
use crate::dashboard::{Job, Message};
use crate::source::{CalendarSource, SourceError};
use std::io;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

pub(crate) fn spawn<S>(source: S, messages: Sender<Message>) -> io::Result<Sender<Job>>
where
    S: CalendarSource + 'static,
{
    let (jobs, inbox) = channel();
    // The thread is detached: it exits once the job sender is dropped, or
    // after finishing a request whose reply has nowhere to go.
    thread::Builder::new()
        .name(String::from("calendar-fetch"))
        .spawn(move || run(source, &inbox, &messages))?;
    Ok(jobs)
}

fn run<S: CalendarSource>(mut source: S, jobs: &Receiver<Job>, messages: &Sender<Message>) {
    let mut watch = SignInWatch::default();
    for job in jobs {
        for msg in execute(&mut source, &mut watch, job) {
            if messages.send(msg).is_err() {
                return;
            }
        }
    }
}

fn execute<S: CalendarSource + ?Sized>(
    source: &mut S,
    watch: &mut SignInWatch,
    job: Job,
) -> Vec<Message> {
    match job {
        Job::SignIn => match source.sign_in() {
            Ok(signed_in) => watch.observe(signed_in).into_iter().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "sign-in failed");
                // The source keeps whatever sign-in state it had before
                std::iter::once(Message::SignInFailed(e.to_string()))
                    .chain(watch.observe(source.is_signed_in()))
                    .collect()
            }
        },
        Job::ListCalendars => {
            let result = source.list_calendars();
            let lost = watch.check_auth(result.as_ref().err());
            std::iter::once(Message::CalendarsLoaded(result))
                .chain(lost)
                .collect()
        }
        Job::ListEvents { ticket, window } => {
            let result = source.list_events(ticket.calendar_id(), &window);
            let lost = watch.check_auth(result.as_ref().err());
            std::iter::once(Message::EventsLoaded { ticket, result })
                .chain(lost)
                .collect()
        }
    }
}

/// Reports sign-in state only when it changes
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct SignInWatch {
    last: Option<bool>,
}

impl SignInWatch {
    fn observe(&mut self, signed_in: bool) -> Option<Message> {
        (self.last.replace(signed_in) != Some(signed_in))
            .then_some(Message::SignInChanged(signed_in))
    }

    // A rejected token means the user is no longer signed in.
    fn check_auth(&mut self, err: Option<&SourceError>) -> Option<Message> {
        if matches!(err, Some(SourceError::Unauthorized)) {
            self.observe(false)
        } else {
            None
        }
    }
}
