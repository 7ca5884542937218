// Path: crates/execution/src/app/router.rs

use super::BlockExecutor;
use bastion_api::state::StateAccess;
use bastion_api::transaction::context::TxContext;
use bastion_types::app::Message;
use bastion_types::error::TransactionError;

impl BlockExecutor {
    /// Dispatches one message to the keeper that owns it.
    pub(super) async fn route(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
        msg: &Message,
    ) -> Result<(), TransactionError> {
        match msg {
            Message::BankSend { .. } => match &self.external {
                Some(handler) if handler.handles(msg) => handler.execute(state, ctx, msg).await,
                _ => Err(TransactionError::Unsupported(msg.msg_type().to_string())),
            },
            Message::ClaimValidator(params) => self
                .staking
                .claim_validator(state, ctx, params)
                .map(|_| ()),
            Message::Pause => self.staking.pause(state, ctx),
            Message::Unpause => self.staking.unpause(state, ctx),
            Message::Activate => self.staking.activate(state, ctx),
            Message::WhitelistPermissions {
                address,
                permission,
            } => self
                .permissions
                .whitelist_permission(state, ctx, address, *permission),
            Message::BlacklistPermissions {
                address,
                permission,
            } => self
                .permissions
                .blacklist_permission(state, ctx, address, *permission),
            Message::CreateRole { role_id, name } => {
                self.permissions.create_role(state, ctx, *role_id, name)
            }
            Message::AssignRole { address, role_id } => {
                self.permissions.assign_role(state, ctx, address, *role_id)
            }
            Message::RemoveRole { address, role_id } => {
                self.permissions.remove_role(state, ctx, address, *role_id)
            }
            Message::WhitelistRolePermission {
                role_id,
                permission,
            } => self
                .permissions
                .update_role_permissions(state, ctx, *role_id, |set| {
                    set.add_to_whitelist(*permission)
                }),
            Message::BlacklistRolePermission {
                role_id,
                permission,
            } => self
                .permissions
                .update_role_permissions(state, ctx, *role_id, |set| {
                    set.add_to_blacklist(*permission)
                }),
            Message::RemoveWhitelistRolePermission {
                role_id,
                permission,
            } => self
                .permissions
                .update_role_permissions(state, ctx, *role_id, |set| {
                    set.remove_from_whitelist(*permission)
                }),
            Message::RemoveBlacklistRolePermission {
                role_id,
                permission,
            } => self
                .permissions
                .update_role_permissions(state, ctx, *role_id, |set| {
                    set.remove_from_blacklist(*permission)
                }),
            Message::SetNetworkProperties(props) => self
                .properties
                .handle_set_network_properties(state, ctx, props),
            Message::SetExecutionFee(fee) => {
                self.properties.handle_set_execution_fee(state, ctx, fee)
            }
            Message::SubmitProposal {
                content,
                description,
            } => {
                let id = self.governance.submit_proposal(
                    state,
                    ctx,
                    content.clone(),
                    description.clone(),
                )?;
                tracing::debug!(target: "exec", id, signer = %ctx.signer, "proposal id assigned");
                Ok(())
            }
            Message::VoteProposal {
                proposal_id,
                option,
            } => self.governance.vote(state, ctx, *proposal_id, *option),
        }
    }
}
