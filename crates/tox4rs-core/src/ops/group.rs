//! Group chats: membership, queries, messaging and moderation.

use tox4rs_protocol::{
    ChatId, FriendNumber, GroupNumber, GroupPrivacyState, GroupRole, MessageType, PeerId,
    UserStatus, MAX_GROUP_NAME_LENGTH, MAX_GROUP_PART_LENGTH, MAX_GROUP_PASSWORD_SIZE,
    MAX_GROUP_TOPIC_LENGTH, MAX_MESSAGE_LENGTH, MAX_NAME_LENGTH,
};

use super::{fixed, within};
use crate::codes::*;
use crate::engine::CoreEngine;
use crate::error::{ensure, Closed, StatusExt, ToxError};
use crate::session::Tox;

impl<E: CoreEngine> Tox<E> {
    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Create a group with us as founder.
    pub fn group_new(
        &self,
        privacy: GroupPrivacyState,
        group_name: &[u8],
        self_name: &[u8],
    ) -> Result<GroupNumber, ToxError<GroupNewCode>> {
        self.invoke(|engine| {
            ensure(!group_name.is_empty(), GroupNewCode::Empty)?;
            ensure(!self_name.is_empty(), GroupNewCode::Empty)?;
            within(group_name.len(), MAX_GROUP_NAME_LENGTH, GroupNewCode::TooLong)?;
            within(self_name.len(), MAX_NAME_LENGTH, GroupNewCode::TooLong)?;
            let group = engine.group_new(privacy, group_name, self_name).mapped()?;
            tracing::debug!(group, ?privacy, "group created");
            Ok(group)
        })
    }

    /// Join a public group by chat id. Membership is confirmed by a
    /// `GroupSelfJoin` event.
    pub fn group_join(
        &self,
        chat_id: &[u8],
        self_name: &[u8],
        password: &[u8],
    ) -> Result<GroupNumber, ToxError<GroupJoinCode>> {
        self.invoke(|engine| {
            let chat_id: ChatId = fixed(chat_id, GroupJoinCode::BadChatId)?;
            ensure(!self_name.is_empty(), GroupJoinCode::Empty)?;
            within(self_name.len(), MAX_NAME_LENGTH, GroupJoinCode::TooLong)?;
            within(password.len(), MAX_GROUP_PASSWORD_SIZE, GroupJoinCode::Password)?;
            engine.group_join(&chat_id, self_name, password).mapped()
        })
    }

    pub fn group_reconnect(&self, group: GroupNumber) -> Result<(), ToxError<GroupReconnectCode>> {
        self.invoke(|engine| engine.group_reconnect(group).mapped())
    }

    /// Leave a group, optionally with a parting message.
    pub fn group_leave(
        &self,
        group: GroupNumber,
        part_message: &[u8],
    ) -> Result<(), ToxError<GroupLeaveCode>> {
        self.invoke(|engine| {
            within(part_message.len(), MAX_GROUP_PART_LENGTH, GroupLeaveCode::TooLong)?;
            engine.group_leave(group, part_message).mapped()
        })
    }

    pub fn group_count(&self) -> Result<u32, Closed> {
        self.query(|engine| engine.group_count())
    }

    // ------------------------------------------------------------------
    // Self within a group
    // ------------------------------------------------------------------

    pub fn group_self_name(&self, group: GroupNumber) -> Result<Vec<u8>, ToxError<GroupSelfQueryCode>> {
        self.invoke(|engine| engine.group_self_name(group).mapped())
    }

    pub fn group_set_self_name(
        &self,
        group: GroupNumber,
        name: &[u8],
    ) -> Result<(), ToxError<GroupSelfNameSetCode>> {
        self.invoke(|engine| {
            ensure(!name.is_empty(), GroupSelfNameSetCode::Invalid)?;
            within(name.len(), MAX_NAME_LENGTH, GroupSelfNameSetCode::TooLong)?;
            engine.group_set_self_name(group, name).mapped()
        })
    }

    pub fn group_self_status(
        &self,
        group: GroupNumber,
    ) -> Result<UserStatus, ToxError<GroupSelfQueryCode>> {
        self.invoke(|engine| engine.group_self_status(group).mapped())
    }

    pub fn group_set_self_status(
        &self,
        group: GroupNumber,
        status: UserStatus,
    ) -> Result<(), ToxError<GroupSelfStatusSetCode>> {
        self.invoke(|engine| engine.group_set_self_status(group, status).mapped())
    }

    pub fn group_self_role(
        &self,
        group: GroupNumber,
    ) -> Result<GroupRole, ToxError<GroupSelfQueryCode>> {
        self.invoke(|engine| engine.group_self_role(group).mapped())
    }

    pub fn group_self_peer_id(
        &self,
        group: GroupNumber,
    ) -> Result<PeerId, ToxError<GroupSelfQueryCode>> {
        self.invoke(|engine| engine.group_self_peer_id(group).mapped())
    }

    // ------------------------------------------------------------------
    // Peers and group state
    // ------------------------------------------------------------------

    pub fn group_peer_name(
        &self,
        group: GroupNumber,
        peer: PeerId,
    ) -> Result<Vec<u8>, ToxError<GroupPeerQueryCode>> {
        self.invoke(|engine| engine.group_peer_name(group, peer).mapped())
    }

    pub fn group_peer_status(
        &self,
        group: GroupNumber,
        peer: PeerId,
    ) -> Result<UserStatus, ToxError<GroupPeerQueryCode>> {
        self.invoke(|engine| engine.group_peer_status(group, peer).mapped())
    }

    pub fn group_peer_role(
        &self,
        group: GroupNumber,
        peer: PeerId,
    ) -> Result<GroupRole, ToxError<GroupPeerQueryCode>> {
        self.invoke(|engine| engine.group_peer_role(group, peer).mapped())
    }

    pub fn group_topic(&self, group: GroupNumber) -> Result<Vec<u8>, ToxError<GroupStateQueryCode>> {
        self.invoke(|engine| engine.group_topic(group).mapped())
    }

    pub fn group_set_topic(
        &self,
        group: GroupNumber,
        topic: &[u8],
    ) -> Result<(), ToxError<GroupTopicSetCode>> {
        self.invoke(|engine| {
            within(topic.len(), MAX_GROUP_TOPIC_LENGTH, GroupTopicSetCode::TooLong)?;
            engine.group_set_topic(group, topic).mapped()
        })
    }

    pub fn group_name(&self, group: GroupNumber) -> Result<Vec<u8>, ToxError<GroupStateQueryCode>> {
        self.invoke(|engine| engine.group_name(group).mapped())
    }

    pub fn group_chat_id(&self, group: GroupNumber) -> Result<ChatId, ToxError<GroupStateQueryCode>> {
        self.invoke(|engine| engine.group_chat_id(group).mapped())
    }

    /// Peers currently in the group, ourselves included.
    pub fn group_peer_count(&self, group: GroupNumber) -> Result<u32, ToxError<GroupStateQueryCode>> {
        self.invoke(|engine| engine.group_peer_count(group).mapped())
    }

    pub fn group_privacy_state(
        &self,
        group: GroupNumber,
    ) -> Result<GroupPrivacyState, ToxError<GroupStateQueryCode>> {
        self.invoke(|engine| engine.group_privacy_state(group).mapped())
    }

    pub fn group_peer_limit(&self, group: GroupNumber) -> Result<u16, ToxError<GroupStateQueryCode>> {
        self.invoke(|engine| engine.group_peer_limit(group).mapped())
    }

    /// Empty when the group has no password.
    pub fn group_password(&self, group: GroupNumber) -> Result<Vec<u8>, ToxError<GroupStateQueryCode>> {
        self.invoke(|engine| engine.group_password(group).mapped())
    }

    // ------------------------------------------------------------------
    // Messaging and invites
    // ------------------------------------------------------------------

    pub fn group_send_message(
        &self,
        group: GroupNumber,
        kind: MessageType,
        message: &[u8],
    ) -> Result<u32, ToxError<GroupSendMessageCode>> {
        self.invoke(|engine| {
            ensure(!message.is_empty(), GroupSendMessageCode::Empty)?;
            within(message.len(), MAX_MESSAGE_LENGTH, GroupSendMessageCode::TooLong)?;
            engine.group_send_message(group, kind, message).mapped()
        })
    }

    pub fn group_send_private_message(
        &self,
        group: GroupNumber,
        peer: PeerId,
        kind: MessageType,
        message: &[u8],
    ) -> Result<(), ToxError<GroupSendPrivateMessageCode>> {
        self.invoke(|engine| {
            ensure(!message.is_empty(), GroupSendPrivateMessageCode::Empty)?;
            within(
                message.len(),
                MAX_MESSAGE_LENGTH,
                GroupSendPrivateMessageCode::TooLong,
            )?;
            engine
                .group_send_private_message(group, peer, kind, message)
                .mapped()
        })
    }

    pub fn group_invite_friend(
        &self,
        group: GroupNumber,
        friend: FriendNumber,
    ) -> Result<(), ToxError<GroupInviteFriendCode>> {
        self.invoke(|engine| engine.group_invite_friend(group, friend).mapped())
    }

    /// Accept invite data received in a `GroupInvite` event.
    pub fn group_accept_invite(
        &self,
        friend: FriendNumber,
        invite_data: &[u8],
        self_name: &[u8],
        password: &[u8],
    ) -> Result<GroupNumber, ToxError<GroupInviteAcceptCode>> {
        self.invoke(|engine| {
            ensure(!invite_data.is_empty(), GroupInviteAcceptCode::BadInvite)?;
            ensure(!self_name.is_empty(), GroupInviteAcceptCode::Empty)?;
            within(self_name.len(), MAX_NAME_LENGTH, GroupInviteAcceptCode::TooLong)?;
            within(password.len(), MAX_GROUP_PASSWORD_SIZE, GroupInviteAcceptCode::Password)?;
            engine
                .group_invite_accept(friend, invite_data, self_name, password)
                .mapped()
        })
    }

    // ------------------------------------------------------------------
    // Founder controls
    // ------------------------------------------------------------------

    /// An empty password removes it.
    pub fn group_founder_set_password(
        &self,
        group: GroupNumber,
        password: &[u8],
    ) -> Result<(), ToxError<GroupFounderSetPasswordCode>> {
        self.invoke(|engine| {
            within(
                password.len(),
                MAX_GROUP_PASSWORD_SIZE,
                GroupFounderSetPasswordCode::TooLong,
            )?;
            engine.group_founder_set_password(group, password).mapped()
        })
    }

    pub fn group_founder_set_privacy_state(
        &self,
        group: GroupNumber,
        privacy: GroupPrivacyState,
    ) -> Result<(), ToxError<GroupFounderSetPrivacyStateCode>> {
        self.invoke(|engine| engine.group_founder_set_privacy_state(group, privacy).mapped())
    }

    pub fn group_founder_set_peer_limit(
        &self,
        group: GroupNumber,
        limit: u16,
    ) -> Result<(), ToxError<GroupFounderSetPeerLimitCode>> {
        self.invoke(|engine| engine.group_founder_set_peer_limit(group, limit).mapped())
    }

    // ------------------------------------------------------------------
    // Moderation
    // ------------------------------------------------------------------

    /// Hide or show a peer's messages locally. Nobody else is told.
    pub fn group_toggle_ignore(
        &self,
        group: GroupNumber,
        peer: PeerId,
        ignore: bool,
    ) -> Result<(), ToxError<GroupToggleIgnoreCode>> {
        self.invoke(|engine| engine.group_toggle_ignore(group, peer, ignore).mapped())
    }

    /// The founder role cannot be handed out.
    pub fn group_mod_set_role(
        &self,
        group: GroupNumber,
        peer: PeerId,
        role: GroupRole,
    ) -> Result<(), ToxError<GroupModSetRoleCode>> {
        self.invoke(|engine| {
            ensure(role != GroupRole::Founder, GroupModSetRoleCode::Assignment)?;
            engine.group_mod_set_role(group, peer, role).mapped()
        })
    }

    /// Kick a peer; with `ban` they also land on the ban list.
    pub fn group_mod_remove_peer(
        &self,
        group: GroupNumber,
        peer: PeerId,
        ban: bool,
    ) -> Result<(), ToxError<GroupModRemovePeerCode>> {
        self.invoke(|engine| engine.group_mod_remove_peer(group, peer, ban).mapped())
    }

    pub fn group_mod_remove_ban(
        &self,
        group: GroupNumber,
        ban_id: u32,
    ) -> Result<(), ToxError<GroupModRemoveBanCode>> {
        self.invoke(|engine| engine.group_mod_remove_ban(group, ban_id).mapped())
    }

    pub fn group_ban_list(&self, group: GroupNumber) -> Result<Vec<u32>, ToxError<GroupBanQueryCode>> {
        self.invoke(|engine| engine.group_ban_list(group).mapped())
    }

    pub fn group_ban_name(
        &self,
        group: GroupNumber,
        ban_id: u32,
    ) -> Result<Vec<u8>, ToxError<GroupBanQueryCode>> {
        self.invoke(|engine| engine.group_ban_name(group, ban_id).mapped())
    }
}
