//! # Alarms
//!
//! Threshold alarms on the function, the API and the database. They carry no
//! actions; operators watch them in the console or wire notifications later.

use serde_json::{json, Value};
use tracing::info;

use super::api::Api;
use super::compute::Compute;
use super::database::Database;
use crate::constants::{ALARM_EVALUATION_PERIODS, ALARM_PERIOD_SECS};
use crate::error::StackError;
use crate::stack::StackBuilder;
use crate::template::{Resource, ResourceHandle};

/// Which declared resource an alarm watches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmTarget {
    Function,
    Api,
    Database,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Sum,
    Average,
}

impl Statistic {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Sum => "Sum",
            Statistic::Average => "Average",
        }
    }
}

/// A row of the alarm table
#[derive(Debug, Clone, Copy)]
pub struct AlarmSpec {
    pub logical_id: &'static str,
    /// Appended to the stack prefix to form the alarm name
    pub name: &'static str,
    pub description: &'static str,
    pub target: AlarmTarget,
    pub namespace: &'static str,
    pub metric: &'static str,
    pub statistic: Statistic,
    pub threshold: u32,
}

pub const ALARMS: [AlarmSpec; 6] = [
    AlarmSpec {
        logical_id: "LambdaErrorAlarm",
        name: "lambda-errors",
        description: "Lambda function error rate is high",
        target: AlarmTarget::Function,
        namespace: "AWS/Lambda",
        metric: "Errors",
        statistic: Statistic::Sum,
        threshold: 5,
    },
    AlarmSpec {
        logical_id: "LambdaDurationAlarm",
        name: "lambda-duration",
        description: "Lambda function duration is high",
        target: AlarmTarget::Function,
        namespace: "AWS/Lambda",
        metric: "Duration",
        statistic: Statistic::Average,
        threshold: 10_000,
    },
    AlarmSpec {
        logical_id: "Api4xxAlarm",
        name: "api-4xx-errors",
        description: "API Gateway 4XX error rate is high",
        target: AlarmTarget::Api,
        namespace: "AWS/ApiGateway",
        metric: "4XXError",
        statistic: Statistic::Sum,
        threshold: 10,
    },
    AlarmSpec {
        logical_id: "Api5xxAlarm",
        name: "api-5xx-errors",
        description: "API Gateway 5XX error rate is high",
        target: AlarmTarget::Api,
        namespace: "AWS/ApiGateway",
        metric: "5XXError",
        statistic: Statistic::Sum,
        threshold: 5,
    },
    AlarmSpec {
        logical_id: "DatabaseCpuAlarm",
        name: "db-cpu-utilization",
        description: "Database CPU utilization is high",
        target: AlarmTarget::Database,
        namespace: "AWS/RDS",
        metric: "CPUUtilization",
        statistic: Statistic::Average,
        threshold: 80,
    },
    AlarmSpec {
        logical_id: "DatabaseConnectionsAlarm",
        name: "db-connections",
        description: "Database connection count is high",
        target: AlarmTarget::Database,
        namespace: "AWS/RDS",
        metric: "DatabaseConnections",
        statistic: Statistic::Average,
        threshold: 80,
    },
];

/// The resources alarms can watch
#[derive(Debug, Clone, Copy)]
pub struct AlarmTargets<'a> {
    pub compute: &'a Compute,
    pub api: &'a Api,
    pub database: &'a Database,
}

impl AlarmTargets<'_> {
    fn dimensions(&self, target: AlarmTarget) -> Value {
        match target {
            AlarmTarget::Function => json!([{
                "Name": "FunctionName",
                "Value": self.compute.function.reference()
            }]),
            AlarmTarget::Api => json!([{
                "Name": "ApiName",
                "Value": self.api.name
            }]),
            AlarmTarget::Database => json!([{
                "Name": "DBInstanceIdentifier",
                "Value": self.database.instance.reference()
            }]),
        }
    }
}

/// Declare every alarm when `enabled`, none otherwise
///
/// This is the only place the alarms flag is consulted.
pub fn declare(
    builder: &mut StackBuilder,
    enabled: bool,
    prefix: &str,
    targets: AlarmTargets<'_>,
) -> Result<Vec<ResourceHandle>, StackError> {
    info!(enabled, count = ALARMS.len(), "declaring alarms");

    let declared = builder.declare_if(enabled, |builder| {
        ALARMS
            .iter()
            .map(|alarm| {
                builder.declare(
                    Resource::new(alarm.logical_id, "AWS::CloudWatch::Alarm").properties(json!({
                        "AlarmName": format!("{prefix}-{}", alarm.name),
                        "AlarmDescription": alarm.description,
                        "Namespace": alarm.namespace,
                        "MetricName": alarm.metric,
                        "Dimensions": targets.dimensions(alarm.target),
                        "Statistic": alarm.statistic.as_str(),
                        "Period": ALARM_PERIOD_SECS,
                        "EvaluationPeriods": ALARM_EVALUATION_PERIODS,
                        "Threshold": alarm.threshold,
                        "ComparisonOperator": "GreaterThanThreshold",
                        "TreatMissingData": "missing"
                    })),
                )
            })
            .collect::<Result<Vec<_>, _>>()
    })?;

    Ok(declared.unwrap_or_default())
}
