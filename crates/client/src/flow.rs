//! The bid submission flow.
//!
//! Control flow: the validator computes eligibility, the risk gate compares
//! the proposed amount against five times a reference value (historical
//! average winning bid, falling back to the minimum bid), and the submitter
//! broadcasts the transaction, awaits confirmation, and invalidates the two
//! cached query results so the UI refetches.
//!
//! Submission state machine:
//!
//! ```text
//! Idle -> Validating -> (WarningPending | Submitting) -> Idle
//! ```
//!
//! `WarningPending` moves to `Submitting` only on explicit confirmation, or
//! back to `Idle` on cancel. Any non-`Idle` state acts as the in-flight
//! flag: a second submission attempt is a no-op. Submission always returns
//! to `Idle`, whether the transaction succeeded or failed; failures are
//! logged and swallowed.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info, warn};

use dao_auction_house::HouseCall;
use dao_auction_types::{minimum_bid, Address, AuctionContext, BidTransaction, Wei};

use crate::cache::QueryCache;
use crate::error::ClientError;
use crate::rpc::{HouseReader, HouseWriter};

/// Warn when a bid exceeds this multiple of the reference value.
const RISK_MULTIPLIER: u128 = 5;

/// Submission state. Anything but `Idle` counts as in-flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FlowState {
    Idle,
    Validating,
    WarningPending { amount: Wei, threshold: Wei },
    Submitting,
}

/// Outcome of a submission attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another attempt is in flight; nothing was done.
    Busy,
    /// The amount is below the minimum bid; submission stays disabled.
    Rejected { minimum: Wei },
    /// The amount tripped the risk gate; call `confirm` or `cancel`.
    NeedsConfirmation { amount: Wei, threshold: Wei },
    /// The attempt ran to the end and the flow is idle again. Says nothing
    /// about whether the transaction landed; failures are swallowed.
    Completed,
}

/// The bid submission flow for one auction context.
pub struct BidFlow<C> {
    ctx: AuctionContext,
    sender: Address,
    client: C,
    cache: Arc<QueryCache>,
    state: Mutex<FlowState>,
}

impl<C> BidFlow<C>
where
    C: HouseReader + HouseWriter,
{
    pub fn new(ctx: AuctionContext, sender: Address, client: C, cache: Arc<QueryCache>) -> Self {
        Self {
            ctx,
            sender,
            client,
            cache,
            state: Mutex::new(FlowState::Idle),
        }
    }

    pub fn context(&self) -> &AuctionContext {
        &self.ctx
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Whether no submission attempt is outstanding.
    pub fn is_idle(&self) -> bool {
        *self.state.lock() == FlowState::Idle
    }

    /// Attempt to submit a bid of `amount`.
    pub async fn submit(&self, amount: Wei) -> SubmitOutcome {
        {
            let mut state = self.state.lock();
            if *state != FlowState::Idle {
                return SubmitOutcome::Busy;
            }
            *state = FlowState::Validating;
        }

        let minimum = match self.fresh_minimum().await {
            Ok(minimum) => minimum,
            Err(e) => {
                error!(error = %e, "bid validation failed");
                *self.state.lock() = FlowState::Idle;
                return SubmitOutcome::Completed;
            }
        };
        if amount < minimum {
            *self.state.lock() = FlowState::Idle;
            return SubmitOutcome::Rejected { minimum };
        }

        // Risk gate: reference is the historical average when available,
        // the minimum bid otherwise. The statistic is a heuristic, never a
        // validation constraint.
        let reference = match self.cache.average_winning_bid(&self.ctx, &self.client).await {
            Ok(average) => average.unwrap_or(minimum),
            Err(e) => {
                warn!(error = %e, "average winning bid unavailable");
                minimum
            }
        };
        let threshold = reference.saturating_mul(RISK_MULTIPLIER);
        if amount > threshold {
            *self.state.lock() = FlowState::WarningPending { amount, threshold };
            info!(amount = %amount, threshold = %threshold, "large bid held for confirmation");
            return SubmitOutcome::NeedsConfirmation { amount, threshold };
        }

        self.execute(amount).await
    }

    /// Proceed with a bid held by the risk gate.
    pub async fn confirm(&self) -> SubmitOutcome {
        let amount = {
            let mut state = self.state.lock();
            match *state {
                FlowState::WarningPending { amount, .. } => {
                    *state = FlowState::Validating;
                    amount
                }
                _ => return SubmitOutcome::Busy,
            }
        };
        self.execute(amount).await
    }

    /// Abort a bid held by the risk gate. No side effects.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        if matches!(*state, FlowState::WarningPending { .. }) {
            *state = FlowState::Idle;
        }
    }

    async fn execute(&self, amount: Wei) -> SubmitOutcome {
        *self.state.lock() = FlowState::Submitting;
        if let Err(e) = self.try_execute(amount).await {
            // deliberately swallowed; the caller observes only the reset
            error!(error = %e, "bid submission failed");
        }
        *self.state.lock() = FlowState::Idle;
        SubmitOutcome::Completed
    }

    async fn try_execute(&self, amount: Wei) -> Result<(), ClientError> {
        // The auction may have moved between compute and confirm; re-check
        // against fresh state before spending anything.
        let minimum = self.fresh_minimum().await?;
        if amount < minimum {
            return Err(ClientError::Chain(format!(
                "bid below minimum of {minimum} wei"
            )));
        }

        let tx = BidTransaction {
            from: self.sender,
            to: self.ctx.house,
            value: amount,
            data: HouseCall::CreateBid {
                token_id: self.ctx.token_id,
            }
            .encode(),
            chain_id: self.ctx.chain_id,
        };

        let hash = self.client.send_bid(&tx).await?;
        info!(tx = %hash, "bid transaction broadcast");

        let receipt = self.client.wait_confirmed(hash).await?;
        if !receipt.status {
            return Err(ClientError::Chain(format!("transaction {hash} reverted")));
        }

        self.cache.invalidate(&self.ctx.bid_list_key());
        self.cache.invalidate(&self.ctx.average_bid_key());
        info!(token_id = self.ctx.token_id, "bid confirmed, caches invalidated");
        Ok(())
    }

    async fn fresh_minimum(&self) -> Result<Wei, ClientError> {
        let params = self.client.auction_params().await?;
        let auction = self.client.current_auction().await?;
        let highest = auction.and_then(|a| a.highest_bid).map(|b| b.amount);
        Ok(minimum_bid(
            params.reserve_price,
            params.min_bid_increment,
            highest,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBehavior, MockHouseClient};
    use dao_auction_types::{parse_ether, Bid, ChainId, TxHash, ETH};

    fn test_ctx() -> AuctionContext {
        AuctionContext {
            chain_id: ChainId(1),
            dao_name: "Example DAO".to_string(),
            house: Address([0xaa; 20]),
            token: Address([0xbb; 20]),
            token_id: 3,
        }
    }

    fn flow_with(client: MockHouseClient) -> BidFlow<MockHouseClient> {
        BidFlow::new(
            test_ctx(),
            Address([0x42; 20]),
            client,
            Arc::new(QueryCache::new()),
        )
    }

    fn highest(eth: &str) -> Option<Bid> {
        Some(Bid {
            bidder: Address([1; 20]),
            amount: parse_ether(eth).unwrap(),
            block_timestamp: 0,
            tx_hash: TxHash::default(),
        })
    }

    #[tokio::test]
    async fn safe_bid_submits_and_invalidates_both_keys() {
        let flow = flow_with(MockHouseClient::new());

        // reserve 1 ETH, no bids, no average -> threshold 5 ETH
        let outcome = flow.submit(parse_ether("2").unwrap()).await;
        assert_eq!(outcome, SubmitOutcome::Completed);
        assert!(flow.is_idle());

        let sent = flow.client().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].value, parse_ether("2").unwrap());
        assert_eq!(sent[0].to, flow.context().house);
        // amount travels as the transaction value; data carries the call
        let call = HouseCall::decode(&sent[0].data).unwrap();
        assert_eq!(call, HouseCall::CreateBid { token_id: 3 });

        let ctx = flow.context();
        assert_eq!(flow.cache().invalidation_count(&ctx.bid_list_key()), 1);
        assert_eq!(flow.cache().invalidation_count(&ctx.average_bid_key()), 1);
    }

    #[tokio::test]
    async fn below_minimum_is_rejected_without_a_transaction() {
        let client = MockHouseClient::new();
        client.set_highest_bid(highest("2"));
        let flow = flow_with(client);

        let outcome = flow.submit(parse_ether("2.1").unwrap()).await;
        assert_eq!(
            outcome,
            SubmitOutcome::Rejected {
                minimum: parse_ether("2.2").unwrap()
            }
        );
        assert!(flow.is_idle());
        assert!(flow.client().sent().is_empty());
    }

    #[tokio::test]
    async fn oversized_bid_without_average_warns_on_minimum_multiple() {
        let client = MockHouseClient::new();
        client.set_highest_bid(highest("2"));
        let flow = flow_with(client);

        // minimum 2.2 ETH, no average -> threshold 11 ETH
        let outcome = flow.submit(parse_ether("11.5").unwrap()).await;
        assert_eq!(
            outcome,
            SubmitOutcome::NeedsConfirmation {
                amount: parse_ether("11.5").unwrap(),
                threshold: parse_ether("11").unwrap()
            }
        );
        assert!(flow.client().sent().is_empty());

        let outcome = flow.confirm().await;
        assert_eq!(outcome, SubmitOutcome::Completed);
        assert_eq!(flow.client().sent().len(), 1);
    }

    #[tokio::test]
    async fn bid_at_threshold_submits_immediately() {
        let client = MockHouseClient::new();
        client.set_average(Some(Wei(2 * ETH)));
        let flow = flow_with(client);

        // average 2 ETH -> threshold 10 ETH; 10 is not above it
        let outcome = flow.submit(parse_ether("10").unwrap()).await;
        assert_eq!(outcome, SubmitOutcome::Completed);
        assert_eq!(flow.client().sent().len(), 1);
    }

    #[tokio::test]
    async fn average_takes_precedence_over_minimum() {
        let client = MockHouseClient::new();
        client.set_average(Some(Wei(2 * ETH)));
        let flow = flow_with(client);

        // minimum is 1 ETH but the reference is the 2 ETH average
        let outcome = flow.submit(parse_ether("10.5").unwrap()).await;
        assert!(matches!(
            outcome,
            SubmitOutcome::NeedsConfirmation { threshold, .. }
                if threshold == Wei(10 * ETH)
        ));
        flow.cancel();
    }

    #[tokio::test]
    async fn cancel_aborts_without_side_effects() {
        let flow = flow_with(MockHouseClient::new());

        let outcome = flow.submit(parse_ether("6").unwrap()).await;
        assert!(matches!(outcome, SubmitOutcome::NeedsConfirmation { .. }));
        assert!(!flow.is_idle());

        flow.cancel();
        assert!(flow.is_idle());
        assert!(flow.client().sent().is_empty());

        let ctx = flow.context();
        assert_eq!(flow.cache().invalidation_count(&ctx.bid_list_key()), 0);
        assert_eq!(flow.cache().invalidation_count(&ctx.average_bid_key()), 0);
    }

    #[tokio::test]
    async fn second_attempt_while_warning_pending_is_a_noop() {
        let flow = flow_with(MockHouseClient::new());

        let outcome = flow.submit(parse_ether("6").unwrap()).await;
        assert!(matches!(outcome, SubmitOutcome::NeedsConfirmation { .. }));

        assert_eq!(flow.submit(parse_ether("2").unwrap()).await, SubmitOutcome::Busy);
        assert!(flow.client().sent().is_empty());
    }

    #[tokio::test]
    async fn second_attempt_while_submitting_is_a_noop() {
        let client = MockHouseClient::new();
        client.set_behavior(MockBehavior {
            hold_confirm: true,
            ..Default::default()
        });
        let flow = Arc::new(flow_with(client));

        let background = {
            let flow = Arc::clone(&flow);
            tokio::spawn(async move { flow.submit(parse_ether("2").unwrap()).await })
        };
        while flow.is_idle() {
            tokio::task::yield_now().await;
        }

        assert_eq!(flow.submit(parse_ether("3").unwrap()).await, SubmitOutcome::Busy);

        flow.client().release_confirm();
        assert_eq!(background.await.unwrap(), SubmitOutcome::Completed);
        assert!(flow.is_idle());
        assert_eq!(flow.client().sent().len(), 1);
    }

    #[tokio::test]
    async fn broadcast_failure_is_swallowed_and_resets() {
        let client = MockHouseClient::new();
        client.set_behavior(MockBehavior {
            fail_send: true,
            ..Default::default()
        });
        let flow = flow_with(client);

        let outcome = flow.submit(parse_ether("2").unwrap()).await;
        assert_eq!(outcome, SubmitOutcome::Completed);
        assert!(flow.is_idle());

        let ctx = flow.context();
        assert_eq!(flow.cache().invalidation_count(&ctx.bid_list_key()), 0);
        assert_eq!(flow.cache().invalidation_count(&ctx.average_bid_key()), 0);
    }

    #[tokio::test]
    async fn reverted_transaction_does_not_invalidate() {
        let client = MockHouseClient::new();
        client.set_behavior(MockBehavior {
            revert: true,
            ..Default::default()
        });
        let flow = flow_with(client);

        let outcome = flow.submit(parse_ether("2").unwrap()).await;
        assert_eq!(outcome, SubmitOutcome::Completed);
        assert!(flow.is_idle());
        assert_eq!(flow.client().sent().len(), 1);

        let ctx = flow.context();
        assert_eq!(flow.cache().invalidation_count(&ctx.bid_list_key()), 0);
    }

    #[tokio::test]
    async fn confirm_re_checks_the_minimum() {
        let client = MockHouseClient::new();
        let flow = flow_with(client);

        let outcome = flow.submit(parse_ether("6").unwrap()).await;
        assert!(matches!(outcome, SubmitOutcome::NeedsConfirmation { .. }));

        // someone outbids past 6 ETH while the warning dialog is open
        flow.client().set_highest_bid(highest("6"));

        let outcome = flow.confirm().await;
        assert_eq!(outcome, SubmitOutcome::Completed);
        // the re-check refused to spend; nothing was broadcast
        assert!(flow.client().sent().is_empty());
        assert!(flow.is_idle());
    }

    #[tokio::test]
    async fn confirm_without_pending_warning_is_a_noop() {
        let flow = flow_with(MockHouseClient::new());
        assert_eq!(flow.confirm().await, SubmitOutcome::Busy);
        flow.cancel(); // also a no-op
        assert!(flow.is_idle());
    }
}
