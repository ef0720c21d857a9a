//! Complaint Router
//!
//! The router maps complaint text to the department that should handle it.
//! The domain only depends on the [`ComplaintRouter`] contract; which
//! classifier stands behind it is a deployment decision.
//!
//! - [`KeywordRouter`]: deterministic rule table, no external calls
//! - [`ResilientRouter`]: wraps any router with a retry policy and a circuit
//!   breaker so that a flaky classification service surfaces as
//!   `ExternalServiceUnavailable` instead of hanging a submission

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use core_kernel::{CircuitBreakerConfig, PortError, RetryPolicy};

use crate::department::Department;

/// Classifies complaint text into a department label
#[async_trait]
pub trait ComplaintRouter: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Department, PortError>;
}

/// One routing rule: any keyword hit counts towards `department`
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pub department: Department,
    pub keywords: Vec<String>,
}

/// Routes by counting case-insensitive keyword hits
///
/// The department with the most hits wins; ties go to the rule listed
/// first. Text with no hits goes to the fallback department.
#[derive(Debug, Clone)]
pub struct KeywordRouter {
    rules: Vec<KeywordRule>,
    fallback: Department,
}

impl KeywordRouter {
    pub fn new(rules: Vec<KeywordRule>, fallback: Department) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| KeywordRule {
                department: rule.department,
                keywords: rule.keywords.iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();
        Self { rules, fallback }
    }

    /// Rules covering product defects (QC), paperwork (QA) and service (MCS)
    ///
    /// Keywords are English and Thai; customers write in either.
    pub fn steel_mill_defaults() -> Result<Self, PortError> {
        let rule = |label: &str, keywords: &[&str]| -> Result<KeywordRule, PortError> {
            Ok(KeywordRule {
                department: Department::new(label)
                    .map_err(|e| PortError::validation(e.to_string()))?,
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            })
        };

        let rules = vec![
            rule("QC", &[
                "rust", "dent", "thickness", "scratch", "hardness", "coating",
                "oil", "elongation", "sharp edge", "yield strength", "defect",
                "crack", "surface", "dimension", "flatness", "burr",
                "สนิม", "บุบ", "ความหนา", "รอยขีดข่วน", "ความแข็ง", "สีเคลือบ",
                "คราบน้ำมัน", "ยืดตัว", "ขอบเหล็กคม", "รอยกด", "แตก", "ผิวเหล็ก",
            ])?,
            rule("QA", &[
                "coa", "certificate", "document", "grade", "iso", "traceab",
                "label", "mill sheet", "paperwork", "specification mismatch",
                "เอกสาร", "ใบเซอร์", "รับรองคุณภาพ", "เกรดเหล็ก", "ตรวจสอบย้อนกลับ", "ป้าย",
            ])?,
            rule("MCS", &[
                "deliver", "late", "delay", "sales", "driver", "wrong location",
                "packag", "transport", "quotation", "carrier", "shipping",
                "freight", "after-sales", "service", "status update",
                "ส่งของ", "ล่าช้า", "ขนส่ง", "ฝ่ายขาย", "พนักงานขับรถ", "ผิดสถานที่",
                "แพ็คเกจ", "ใบเสนอราคา", "ประสานงาน", "ไม่ตรงเวลา", "สถานะสินค้า", "บริการ",
            ])?,
        ];
        let fallback = Department::new("MCS").map_err(|e| PortError::validation(e.to_string()))?;
        Ok(Self::new(rules, fallback))
    }

    fn score(&self, text: &str) -> Department {
        let text = text.to_lowercase();
        let mut best: Option<(&Department, usize)> = None;

        for rule in &self.rules {
            let hits = rule.keywords.iter().filter(|k| text.contains(k.as_str())).count();
            if hits > 0 && best.map_or(true, |(_, top)| hits > top) {
                best = Some((&rule.department, hits));
            }
        }

        best.map(|(d, _)| d.clone()).unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl ComplaintRouter for KeywordRouter {
    async fn classify(&self, text: &str) -> Result<Department, PortError> {
        if text.trim().is_empty() {
            return Err(PortError::validation_field("complaint text is empty", "complaint"));
        }
        let department = self.score(text);
        tracing::debug!(%department, "Complaint routed by keyword rules");
        Ok(department)
    }
}

/// Circuit breaker state for fault tolerance
#[derive(Debug)]
struct CircuitBreaker {
    config: CircuitBreakerConfig,
    failure_count: AtomicU64,
    success_count: AtomicU64,
    is_open: AtomicBool,
    last_failure_time: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            failure_count: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            is_open: AtomicBool::new(false),
            last_failure_time: RwLock::new(None),
        }
    }

    async fn is_available(&self) -> bool {
        if !self.is_open.load(Ordering::Relaxed) {
            return true;
        }

        // Half-open once the reset timeout has elapsed
        let last_failure = self.last_failure_time.read().await;
        match *last_failure {
            Some(time) => time.elapsed() > Duration::from_secs(self.config.reset_timeout_secs),
            None => false,
        }
    }

    fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
        let success = self.success_count.fetch_add(1, Ordering::Relaxed) + 1;
        if success >= u64::from(self.config.success_threshold) {
            self.is_open.store(false, Ordering::Relaxed);
            self.success_count.store(0, Ordering::Relaxed);
        }
    }

    async fn record_failure(&self) {
        self.success_count.store(0, Ordering::Relaxed);
        let failures = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= u64::from(self.config.failure_threshold) {
            if !self.is_open.swap(true, Ordering::Relaxed) {
                tracing::warn!(failures, "Router circuit opened");
            }
            *self.last_failure_time.write().await = Some(Instant::now());
        }
    }
}

/// Router decorator adding retries with backoff and a circuit breaker
#[derive(Debug)]
pub struct ResilientRouter<R> {
    inner: R,
    retry: RetryPolicy,
    circuit_breaker: Option<CircuitBreaker>,
}

impl<R: ComplaintRouter> ResilientRouter<R> {
    pub fn new(inner: R, retry: RetryPolicy, circuit_breaker: Option<CircuitBreakerConfig>) -> Self {
        Self {
            inner,
            retry,
            circuit_breaker: circuit_breaker.map(CircuitBreaker::new),
        }
    }

    /// Checks if the circuit breaker is open (blocking requests)
    pub async fn is_circuit_open(&self) -> bool {
        match self.circuit_breaker {
            Some(ref cb) => !cb.is_available().await,
            None => false,
        }
    }
}

#[async_trait]
impl<R: ComplaintRouter> ComplaintRouter for ResilientRouter<R> {
    async fn classify(&self, text: &str) -> Result<Department, PortError> {
        if self.is_circuit_open().await {
            return Err(PortError::ServiceUnavailable {
                service: "complaint router (circuit open)".to_string(),
            });
        }

        let result = self.retry.run("classify", || self.inner.classify(text)).await;

        if let Some(ref cb) = self.circuit_breaker {
            match &result {
                Ok(_) => cb.record_success(),
                Err(err) if err.is_transient() => cb.record_failure().await,
                Err(_) => {}
            }
        }

        result
    }
}

/// Router that always answers with the same department
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[derive(Debug)]
    pub struct FixedRouter {
        department: Department,
        failures_before_success: AtomicU32,
        calls: AtomicU32,
    }

    impl FixedRouter {
        pub fn new(department: Department) -> Self {
            Self {
                department,
                failures_before_success: AtomicU32::new(0),
                calls: AtomicU32::new(0),
            }
        }

        /// Makes the first `n` calls fail with a connection error
        pub fn failing_first(self, n: u32) -> Self {
            self.failures_before_success.store(n, Ordering::SeqCst);
            self
        }

        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ComplaintRouter for FixedRouter {
        async fn classify(&self, _text: &str) -> Result<Department, PortError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success.load(Ordering::SeqCst) {
                return Err(PortError::connection("classifier unreachable"));
            }
            Ok(self.department.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::mock::FixedRouter;

    fn dept(label: &str) -> Department {
        Department::new(label).unwrap()
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 1,
            multiplier: 1,
        }
    }

    #[tokio::test]
    async fn test_keyword_router_defaults() {
        let router = KeywordRouter::steel_mill_defaults().unwrap();
        assert_eq!(router.classify("Rust on the coil edge").await.unwrap(), dept("QC"));
        assert_eq!(router.classify("COA does not match the certificate").await.unwrap(), dept("QA"));
        assert_eq!(router.classify("Delivery was late again").await.unwrap(), dept("MCS"));
    }

    #[tokio::test]
    async fn test_keyword_router_reads_thai_complaints() {
        let router = KeywordRouter::steel_mill_defaults().unwrap();
        let cases = [
            ("สนิมขึ้นที่ขอบเหล็ก", "QC"),
            ("สินค้าบุบ", "QC"),
            ("ผิวเหล็กเป็นรอยขีดข่วน", "QC"),
            ("หาใบเซอร์ไม่เจอ", "QA"),
            ("เอกสารรับรองคุณภาพผิด", "QA"),
            ("ระบุเกรดเหล็กในใบส่งของผิด", "QA"),
            ("ส่งของล่าช้ากว่ากำหนด", "MCS"),
            ("แพ็คเกจจิ้งเสียหายจากการขนส่ง", "MCS"),
            ("รถขนส่งมาไม่ตรงเวลา", "MCS"),
        ];
        for (text, expected) in cases {
            assert_eq!(router.classify(text).await.unwrap(), dept(expected), "{}", text);
        }
    }

    #[tokio::test]
    async fn test_keyword_router_fallback_and_empty() {
        let router = KeywordRouter::steel_mill_defaults().unwrap();
        assert_eq!(router.classify("something odd happened").await.unwrap(), dept("MCS"));
        assert!(router.classify("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_tie_goes_to_first_rule() {
        let router = KeywordRouter::new(
            vec![
                KeywordRule { department: dept("QC"), keywords: vec!["coil".into()] },
                KeywordRule { department: dept("QA"), keywords: vec!["paper".into()] },
            ],
            dept("MCS"),
        );
        assert_eq!(router.classify("coil paper").await.unwrap(), dept("QC"));
    }

    #[tokio::test]
    async fn test_resilient_router_retries_transient() {
        let router = ResilientRouter::new(
            FixedRouter::new(dept("QA")).failing_first(2),
            fast_retry(3),
            None,
        );
        assert_eq!(router.classify("label wrong").await.unwrap(), dept("QA"));
        assert_eq!(router.inner.calls(), 3);
    }

    #[tokio::test]
    async fn test_resilient_router_opens_circuit() {
        let router = ResilientRouter::new(
            FixedRouter::new(dept("QA")).failing_first(100),
            fast_retry(1),
            Some(CircuitBreakerConfig {
                failure_threshold: 2,
                reset_timeout_secs: 60,
                success_threshold: 1,
            }),
        );

        assert!(router.classify("x").await.is_err());
        assert!(router.classify("x").await.is_err());
        assert!(router.is_circuit_open().await);

        let calls_before = router.inner.calls();
        let err = router.classify("x").await.unwrap_err();
        assert!(matches!(err, PortError::ServiceUnavailable { .. }));
        assert_eq!(router.inner.calls(), calls_before);
    }
}
