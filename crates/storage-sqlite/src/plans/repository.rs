use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

use navfolio_core::errors::ValidationError;
use navfolio_core::plans::{
    InvestmentPlan, InvestmentPlanUpdate, NewInvestmentPlan, PlanExecution, PlanRepositoryTrait,
};
use navfolio_core::{Error, Result};

use super::model::InvestmentPlanDB;
use crate::cashflows::insert_cashflow;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::investment_plans;
use crate::snapshots::{write_holding, write_snapshots};
use crate::utils::decimal_to_db;

pub struct PlanRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PlanRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn execution_day_to_db(day: u32) -> Result<i32> {
    i32::try_from(day).map_err(|_| {
        Error::from(ValidationError::InvalidInput(format!(
            "execution day {} is out of range",
            day
        )))
    })
}

#[async_trait]
impl PlanRepositoryTrait for PlanRepository {
    async fn create(&self, new_plan: NewInvestmentPlan) -> Result<InvestmentPlan> {
        let execution_day = execution_day_to_db(new_plan.execution_day)?;
        self.writer
            .exec(move |conn| {
                let row = InvestmentPlanDB {
                    id: new_plan
                        .id
                        .unwrap_or_else(|| Uuid::new_v4().to_string()),
                    owner_id: new_plan.owner_id,
                    asset_id: new_plan.asset_id,
                    amount: decimal_to_db(new_plan.amount),
                    frequency: new_plan.frequency.as_db_str().to_string(),
                    execution_day,
                    source_asset_id: new_plan.source_asset_id,
                    is_active: new_plan.is_active,
                    created_at: Utc::now().naive_utc(),
                };

                let inserted = diesel::insert_into(investment_plans::table)
                    .values(&row)
                    .returning(InvestmentPlanDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;

                Ok(InvestmentPlan::try_from(inserted)?)
            })
            .await
    }

    async fn update(&self, update: InvestmentPlanUpdate) -> Result<InvestmentPlan> {
        let execution_day = execution_day_to_db(update.execution_day)?;
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(investment_plans::table.find(&update.id))
                    .set((
                        investment_plans::amount.eq(decimal_to_db(update.amount)),
                        investment_plans::frequency.eq(update.frequency.as_db_str()),
                        investment_plans::execution_day.eq(execution_day),
                        investment_plans::source_asset_id.eq(&update.source_asset_id),
                        investment_plans::is_active.eq(update.is_active),
                    ))
                    .returning(InvestmentPlanDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;

                Ok(InvestmentPlan::try_from(updated)?)
            })
            .await
    }

    async fn delete(&self, plan_id: &str) -> Result<usize> {
        let id_owned = plan_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(investment_plans::table.find(id_owned))
                    .execute(conn)
                    .into_core()
            })
            .await
    }

    fn get_by_id(&self, plan_id: &str) -> Result<InvestmentPlan> {
        let mut conn = get_connection(&self.pool)?;

        let row = investment_plans::table
            .find(plan_id)
            .select(InvestmentPlanDB::as_select())
            .first::<InvestmentPlanDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(InvestmentPlan::try_from(row)?)
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<InvestmentPlan>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = investment_plans::table
            .filter(investment_plans::owner_id.eq(owner_id))
            .order(investment_plans::created_at.asc())
            .select(InvestmentPlanDB::as_select())
            .load::<InvestmentPlanDB>(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter()
            .map(|row| InvestmentPlan::try_from(row).map_err(Into::into))
            .collect()
    }

    async fn record_execution(&self, execution: PlanExecution) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let event = insert_cashflow(conn, execution.cashflow)?;
                write_holding(conn, &execution.target_holding)?;
                if let Some(holding) = &execution.source_holding {
                    write_holding(conn, holding)?;
                }
                if let Some(snapshot) = &execution.source_snapshot {
                    write_snapshots(conn, std::slice::from_ref(snapshot))?;
                }

                debug!(
                    "Recorded execution of plan {} on {} as cash flow {}",
                    execution.plan_id, execution.date, event.id
                );
                Ok(())
            })
            .await
    }
}
