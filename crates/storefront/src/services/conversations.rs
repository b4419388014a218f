//! Buyer-owner messaging: fetches, thread reads, and conversation
//! aggregation.
//!
//! A conversation is not a stored entity. Summaries are recomputed on
//! every fetch by folding the user's messages into one row per
//! conversation key: the counterparty combined with the product when the
//! thread is about one, the counterparty alone otherwise. The displayed
//! last message and the unread counter come from two independent folds
//! over the same input, so the unread count never depends on which
//! message happens to be newest.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use serde::Serialize;

use rewear_core::{ProductId, UserId};

use crate::models::SessionAuth;
use crate::supabase::{
    MessageRow, NewMessage, ProductRef, ProfileRef, SupabaseClient, SupabaseError,
};

/// Grouping identity for a thread: counterparty plus optional product.
pub type ConversationKey = (UserId, Option<ProductId>);

/// Delay before the simulated owner reply lands.
const SIMULATED_REPLY_DELAY: Duration = Duration::from_secs(1);

/// Canned owner replies for the chat widget.
const OWNER_REPLIES: &[&str] = &[
    "Yes, this piece is available for the weekend!",
    "The fabric is soft cotton with a silk lining.",
    "I can arrange delivery to your location for a small extra charge.",
    "It fits true to size - if you usually wear a medium, it will fit perfectly.",
    "Plenty of people have rented this one and loved it!",
];

/// One summary row per distinct conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub counterparty_id: UserId,
    pub counterparty: Option<ProfileRef>,
    pub product_id: Option<ProductId>,
    pub product: Option<ProductRef>,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    /// Messages addressed to the current user with `read = false`.
    pub unread: u32,
}

/// Fold messages into one summary per conversation key.
///
/// For each key the retained display message is the strictly newest by
/// `created_at` (ties keep the first seen); the unread counter increments
/// for every message addressed to `me` that is still unread, wherever it
/// falls in the thread. No messages produce no summaries.
#[must_use]
pub fn group_conversations(messages: &[MessageRow], me: UserId) -> Vec<ConversationSummary> {
    let mut threads: HashMap<ConversationKey, ConversationSummary> = HashMap::new();

    for message in messages {
        let (counterparty_id, counterparty) = if message.sender_id == me {
            (message.receiver_id, message.receiver.clone())
        } else {
            (message.sender_id, message.sender.clone())
        };

        let key = (counterparty_id, message.product_id);
        let unread_here = u32::from(message.receiver_id == me && !message.read);

        match threads.entry(key) {
            Entry::Occupied(mut entry) => {
                let summary = entry.get_mut();
                summary.unread += unread_here;
                if message.created_at > summary.last_message_at {
                    summary.last_message = message.content.clone();
                    summary.last_message_at = message.created_at;
                    summary.counterparty = counterparty;
                    summary.product = message.product.clone();
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(ConversationSummary {
                    counterparty_id,
                    counterparty,
                    product_id: message.product_id,
                    product: message.product.clone(),
                    last_message: message.content.clone(),
                    last_message_at: message.created_at,
                    unread: unread_here,
                });
            }
        }
    }

    let mut summaries: Vec<ConversationSummary> = threads.into_values().collect();
    summaries.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
    summaries
}

/// Messaging service over the remote `messages` table.
pub struct MessageService<'a> {
    supabase: &'a SupabaseClient,
}

impl<'a> MessageService<'a> {
    /// Create a new messaging service.
    #[must_use]
    pub const fn new(supabase: &'a SupabaseClient) -> Self {
        Self { supabase }
    }

    /// The user's conversation summaries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the message fetch fails.
    pub async fn conversations(
        &self,
        auth: &SessionAuth,
    ) -> Result<Vec<ConversationSummary>, SupabaseError> {
        let messages = self
            .supabase
            .messages_for_user(auth.user.id, &auth.access_token)
            .await?;
        Ok(group_conversations(&messages, auth.user.id))
    }

    /// The user's thread for one product, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the message fetch fails.
    pub async fn product_thread(
        &self,
        product: ProductId,
        auth: &SessionAuth,
    ) -> Result<Vec<MessageRow>, SupabaseError> {
        self.supabase
            .messages_by_product(product, auth.user.id, &auth.access_token)
            .await
    }

    /// Send a message and schedule the simulated owner reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails; no reply is scheduled then.
    pub async fn send(
        &self,
        auth: &SessionAuth,
        receiver: UserId,
        product: Option<ProductId>,
        content: String,
    ) -> Result<MessageRow, SupabaseError> {
        let message = NewMessage {
            sender_id: auth.user.id,
            receiver_id: receiver,
            product_id: product,
            content,
            read: false,
        };

        let row = self
            .supabase
            .insert_message(&message, &auth.access_token)
            .await?;

        self.schedule_owner_reply(auth, receiver, product);

        Ok(row)
    }

    /// Mark the thread from `counterparty` to the current user as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_read(
        &self,
        auth: &SessionAuth,
        counterparty: UserId,
        product: Option<ProductId>,
    ) -> Result<(), SupabaseError> {
        self.supabase
            .mark_messages_read(counterparty, auth.user.id, product, &auth.access_token)
            .await
    }

    /// Fire-and-forget timer that posts one canned owner reply into the
    /// thread after a fixed delay. The timer is never cancelled, even if
    /// the thread is closed before it fires.
    fn schedule_owner_reply(&self, auth: &SessionAuth, owner: UserId, product: Option<ProductId>) {
        let Some(reply) = OWNER_REPLIES.choose(&mut rand::rng()).copied() else {
            return;
        };

        let message = NewMessage {
            sender_id: owner,
            receiver_id: auth.user.id,
            product_id: product,
            content: reply.to_owned(),
            read: false,
        };
        let supabase = self.supabase.clone();
        let token = auth.access_token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(SIMULATED_REPLY_DELAY).await;
            if let Err(error) = supabase.insert_message(&message, &token).await {
                tracing::warn!(%error, "simulated owner reply was not delivered");
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use rewear_core::MessageId;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 12, minute, 0).unwrap()
    }

    fn message(
        sender: UserId,
        receiver: UserId,
        product: Option<ProductId>,
        content: &str,
        read: bool,
        created_at: DateTime<Utc>,
    ) -> MessageRow {
        MessageRow {
            id: MessageId::generate(),
            sender_id: sender,
            receiver_id: receiver,
            product_id: product,
            content: content.to_string(),
            read,
            created_at,
            sender: Some(ProfileRef {
                username: "sender".to_string(),
                full_name: None,
                avatar_url: None,
            }),
            receiver: Some(ProfileRef {
                username: "receiver".to_string(),
                full_name: None,
                avatar_url: None,
            }),
            product: None,
        }
    }

    #[test]
    fn test_no_messages_means_no_summaries() {
        let me = UserId::generate();
        assert!(group_conversations(&[], me).is_empty());
    }

    #[test]
    fn test_one_summary_per_distinct_key() {
        let me = UserId::generate();
        let alice = UserId::generate();
        let bob = UserId::generate();
        let dress = ProductId::generate();

        let messages = vec![
            // Alice about the dress, and Alice in a general thread:
            // distinct keys even with the same counterparty.
            message(alice, me, Some(dress), "about the dress", true, at(1)),
            message(alice, me, None, "hello", true, at(2)),
            message(me, alice, Some(dress), "still about the dress", true, at(3)),
            // Bob about the dress.
            message(bob, me, Some(dress), "is it free?", true, at(4)),
        ];

        let summaries = group_conversations(&messages, me);
        assert_eq!(summaries.len(), 3);
    }

    #[test]
    fn test_latest_message_wins_display() {
        let me = UserId::generate();
        let alice = UserId::generate();

        let messages = vec![
            message(alice, me, None, "newest", true, at(9)),
            message(me, alice, None, "older", true, at(5)),
            message(alice, me, None, "oldest", true, at(1)),
        ];

        let summaries = group_conversations(&messages, me);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].last_message, "newest");
        assert_eq!(summaries[0].last_message_at, at(9));
    }

    #[test]
    fn test_unread_counts_all_unread_to_me() {
        let me = UserId::generate();
        let alice = UserId::generate();

        let messages = vec![
            // The newest message is mine, so it drives the display but
            // never the unread count.
            message(me, alice, None, "my reply", false, at(10)),
            message(alice, me, None, "unread one", false, at(8)),
            message(alice, me, None, "unread two", false, at(6)),
            message(alice, me, None, "already read", true, at(4)),
        ];

        let summaries = group_conversations(&messages, me);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].unread, 2);
        assert_eq!(summaries[0].last_message, "my reply");
    }

    #[test]
    fn test_equal_timestamps_keep_first_seen() {
        let me = UserId::generate();
        let alice = UserId::generate();

        let messages = vec![
            message(alice, me, None, "first seen", true, at(5)),
            message(alice, me, None, "same instant", true, at(5)),
        ];

        let summaries = group_conversations(&messages, me);
        assert_eq!(summaries[0].last_message, "first seen");
    }

    #[test]
    fn test_summaries_sorted_newest_first() {
        let me = UserId::generate();
        let alice = UserId::generate();
        let bob = UserId::generate();

        let messages = vec![
            message(alice, me, None, "old thread", true, at(1)),
            message(bob, me, None, "fresh thread", true, at(9)),
        ];

        let summaries = group_conversations(&messages, me);
        assert_eq!(summaries[0].counterparty_id, bob);
        assert_eq!(summaries[1].counterparty_id, alice);
    }
}
