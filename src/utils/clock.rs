use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use tokio::time::Instant;

/// Represents an entity responsible for providing dates across application. This allows tests to
/// pin the calendar day used for accounting.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    /// Calendar day in the local timezone. Time is accounted into the day returned here.
    fn today(&self) -> NaiveDate {
        self.time().with_timezone(&Local).date_naive()
    }

    fn instant(&self) -> Instant;

    async fn sleep_until(&self, instant: Instant);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, instant: Instant) {
        tokio::time::sleep_until(instant).await;
    }
}

/// Clock stuck on a single day, while still using tokio's timer so paused tests can advance it.
#[cfg(test)]
#[derive(Clone)]
pub struct FixedDayClock {
    pub day: NaiveDate,
}

#[cfg(test)]
#[async_trait]
impl Clock for FixedDayClock {
    fn time(&self) -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.from_utc_datetime(&self.day.and_time(chrono::NaiveTime::MIN))
    }

    fn today(&self) -> NaiveDate {
        self.day
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, instant: Instant) {
        tokio::time::sleep_until(instant).await;
    }
}
