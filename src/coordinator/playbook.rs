//! Remediation playbook keyed by well-known failure signatures.

/// Known failure pattern with its usual cause and fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remedy {
    /// Case-insensitive substring of a log message.
    pub pattern: &'static str,
    pub cause: &'static str,
    pub actions: [&'static str; 3],
}

const PLAYBOOK: &[Remedy] = &[
    Remedy {
        pattern: "connection reset by peer",
        cause: "The remote peer closed the connection while the request was in flight.",
        actions: [
            "Tune network timeouts and add retry logic",
            "Review connection pool settings for stale connections",
            "Add network monitoring and failure recovery logic",
        ],
    },
    Remedy {
        pattern: "sockettimeoutexception",
        cause: "A downstream call did not answer within the socket read timeout.",
        actions: [
            "Raise the timeout and apply a backoff strategy",
            "Tune client socket settings and add retries",
            "Revisit service-to-service timeout parameters",
        ],
    },
    Remedy {
        pattern: "maximum open cursors exceeded",
        cause: "Database cursors are leaking or held open too long.",
        actions: [
            "Adjust the connection pool and optimize queries",
            "Check that sessions and statements are released",
            "Cache frequent queries to reduce cursor usage",
        ],
    },
    Remedy {
        pattern: "outofmemoryerror",
        cause: "The JVM heap was exhausted.",
        actions: [
            "Increase the heap size and look for leak patterns",
            "Stream or page large objects instead of loading them whole",
            "Tune garbage collection and monitor heap usage",
        ],
    },
    Remedy {
        pattern: "duplicate entry",
        cause: "A write violated a unique constraint.",
        actions: [
            "Handle duplicate keys explicitly inside the transaction",
            "Add concurrency control around the conflicting writes",
            "Review unique index design against the business rules",
        ],
    },
    Remedy {
        pattern: "transaction timeout",
        cause: "A transaction ran longer than its configured timeout.",
        actions: [
            "Split large units of work into smaller transactions",
            "Optimize indexes touched by the transaction",
            "Move long-running work to asynchronous processing",
        ],
    },
    Remedy {
        pattern: "jedisconnectionexception",
        cause: "The Redis connection pool had no free connection.",
        actions: [
            "Tune the Redis pool size and monitor pool health",
            "Review Redis cluster capacity and availability",
            "Add a fallback when the cache is unreachable",
        ],
    },
    Remedy {
        pattern: "queue full",
        cause: "Producers outpaced consumers and the queue filled up.",
        actions: [
            "Increase queue capacity and apply backpressure",
            "Throttle producers and speed up consumers",
            "Monitor queue depth and spread the load",
        ],
    },
    Remedy {
        pattern: "recordtoolargeexception",
        cause: "A message exceeded the broker's size limit.",
        actions: [
            "Raise the size limit or split large messages",
            "Compress payloads",
            "Store large bodies externally and send references",
        ],
    },
    Remedy {
        pattern: "nullpointerexception",
        cause: "A required value was absent at runtime.",
        actions: [
            "Add null checks on the failing path",
            "Model optional values explicitly",
            "Cover the edge case with unit tests",
        ],
    },
];

/// Fallback when no playbook entry matches.
pub const GENERIC_REMEDIATION: [&str; 3] = [
    "Inspect the failing request path around the reported time",
    "Check recent deployments and configuration changes",
    "Escalate to the service owners with the trace id",
];

/// First playbook entry whose pattern occurs in `message`.
pub fn remedy_for(message: &str) -> Option<&'static Remedy> {
    let lowered = message.to_lowercase();
    PLAYBOOK.iter().find(|r| lowered.contains(r.pattern))
}

/// Fully qualified exception or error class named in `message`, e.g.
/// `java.io.IOException` for `java.io.IOException: Connection reset by peer`.
pub fn exception_signature(message: &str) -> Option<&str> {
    message
        .split(|c: char| c.is_whitespace() || c == ':' || c == '(' || c == ')')
        .map(|token| token.trim_matches(|c: char| c == ',' || c == ';'))
        .find(|token| {
            let class = token.rsplit('.').next().unwrap_or(token);
            class.len() > "Error".len()
                && class.starts_with(|c: char| c.is_ascii_uppercase())
                && (class.ends_with("Exception") || class.ends_with("Error"))
        })
}
