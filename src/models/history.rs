// src/models/history.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use validator::Validate;

use crate::models::{auth::Role, order::Order};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "history_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Creation,
    Paiement,
    FermetureDemande,
    ChangementStatut,
    ModificationPrix,
    Correction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "validation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    EnAttente,
    Validee,
    Rejetee,
}

/// Decide o estado inicial de uma entrada do histórico.
///
/// Ações de admin e super_admin nascem validadas. Ações de `employe`
/// esperam um admin, exceto a criação, que é só registro.
pub struct ApprovalPolicy;

impl ApprovalPolicy {
    pub fn initial_state(role: Role, action: HistoryAction) -> ValidationStatus {
        match (role, action) {
            (_, HistoryAction::Creation) => ValidationStatus::Validee,
            (Role::Admin | Role::SuperAdmin, _) => ValidationStatus::Validee,
            (Role::Employe, _) => ValidationStatus::EnAttente,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub seq: i64,
    pub commande_id: Uuid,
    pub couturier_id: Uuid,
    pub type_action: HistoryAction,
    #[schema(example = "30000.00")]
    pub montant_paye: Decimal,
    #[schema(example = "0.00")]
    pub reste_apres_paiement: Decimal,
    pub statut_avant: Option<String>,
    pub statut_apres: Option<String>,
    pub commentaire: Option<String>,
    pub statut_validation: ValidationStatus,
    pub admin_validation_id: Option<Uuid>,
    pub date_validation: Option<DateTime<Utc>>,
    pub commentaire_admin: Option<String>,
    pub date_creation: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn is_pending(&self) -> bool {
        self.statut_validation == ValidationStatus::EnAttente
    }
}

#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub commande_id: Uuid,
    pub couturier_id: Uuid,
    pub type_action: HistoryAction,
    pub montant_paye: Decimal,
    pub reste_apres_paiement: Decimal,
    pub statut_avant: Option<String>,
    pub statut_apres: Option<String>,
    pub commentaire: Option<String>,
    pub statut_validation: ValidationStatus,
    pub admin_validation_id: Option<Uuid>,
}

impl NewHistoryEntry {
    /// Monta a entrada aplicando a política de aprovação ao autor.
    pub fn by(actor_id: Uuid, actor_role: Role, commande_id: Uuid, type_action: HistoryAction) -> Self {
        let statut_validation = ApprovalPolicy::initial_state(actor_role, type_action);
        // Criação feita por employe é validada sem admin responsável
        let admin_validation_id = (statut_validation == ValidationStatus::Validee
            && actor_role != Role::Employe)
            .then_some(actor_id);
        Self {
            commande_id,
            couturier_id: actor_id,
            type_action,
            montant_paye: Decimal::ZERO,
            reste_apres_paiement: Decimal::ZERO,
            statut_avant: None,
            statut_apres: None,
            commentaire: None,
            statut_validation,
            admin_validation_id,
        }
    }

    pub fn amounts(mut self, montant_paye: Decimal, reste_apres: Decimal) -> Self {
        self.montant_paye = montant_paye;
        self.reste_apres_paiement = reste_apres;
        self
    }

    pub fn statuses(mut self, avant: Option<&str>, apres: Option<&str>) -> Self {
        self.statut_avant = avant.map(str::to_string);
        self.statut_apres = apres.map(str::to_string);
        self
    }

    pub fn comment(mut self, commentaire: Option<String>) -> Self {
        self.commentaire = commentaire.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn is_auto_approved(&self) -> bool {
        self.statut_validation == ValidationStatus::Validee
    }
}

/// Saldo reconstruído a partir do histórico.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayedBalance {
    pub avance: Decimal,
    pub reste: Decimal,
}

/// Reproduz as entradas em ordem de `seq`. `avance` é a soma dos montantes
/// (correções entram negativas) e `reste` é o da última entrada.
/// Pedidos rejeitados sem dinheiro não contam; um pagamento rejeitado conta,
/// porque a correção que o estorna vem logo depois.
pub fn replay(entries: &[HistoryEntry]) -> Option<ReplayedBalance> {
    let mut ordered: Vec<&HistoryEntry> = entries
        .iter()
        .filter(|e| {
            e.statut_validation != ValidationStatus::Rejetee || e.type_action == HistoryAction::Paiement
        })
        .collect();
    ordered.sort_by_key(|e| e.seq);

    let last = ordered.last()?;
    let avance: Decimal = ordered.iter().map(|e| e.montant_paye).sum();
    Some(ReplayedBalance { avance, reste: last.reste_apres_paiement })
}

/// Entrada pendente com o contexto da commande, para a fila do admin.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingValidation {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub entry: HistoryEntry,
    pub salon_id: String,
    pub modele: String,
    pub client_nom: String,
    pub client_prenom: String,
    pub demandeur_nom: String,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PendingFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovePayload {
    #[validate(length(max = 1000, message = "length"))]
    pub commentaire: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectPayload {
    #[validate(length(min = 1, max = 1000, message = "required"))]
    #[schema(example = "Montant non reçu en caisse")]
    pub motif: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOutcome {
    pub entry: HistoryEntry,
    pub order: Order,
    /// Estorno gravado quando um pagamento é rejeitado
    pub correction: Option<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(seq: i64, action: HistoryAction, montant: i64, reste: i64) -> HistoryEntry {
        HistoryEntry {
            id: Uuid::new_v4(),
            seq,
            commande_id: Uuid::nil(),
            couturier_id: Uuid::nil(),
            type_action: action,
            montant_paye: Decimal::new(montant, 0),
            reste_apres_paiement: Decimal::new(reste, 0),
            statut_avant: None,
            statut_apres: None,
            commentaire: None,
            statut_validation: ValidationStatus::Validee,
            admin_validation_id: None,
            date_validation: None,
            commentaire_admin: None,
            date_creation: Utc::now(),
        }
    }

    #[test]
    fn admins_auto_approve_and_employees_wait() {
        use HistoryAction::*;
        for action in [Paiement, FermetureDemande, ChangementStatut] {
            assert_eq!(ApprovalPolicy::initial_state(Role::Admin, action), ValidationStatus::Validee);
            assert_eq!(ApprovalPolicy::initial_state(Role::SuperAdmin, action), ValidationStatus::Validee);
            assert_eq!(ApprovalPolicy::initial_state(Role::Employe, action), ValidationStatus::EnAttente);
        }
        assert_eq!(ApprovalPolicy::initial_state(Role::Employe, Creation), ValidationStatus::Validee);
    }

    #[test]
    fn auto_approved_entries_name_the_actor_as_validator() {
        let actor = Uuid::new_v4();
        let admin = NewHistoryEntry::by(actor, Role::Admin, Uuid::nil(), HistoryAction::Paiement);
        assert_eq!(admin.admin_validation_id, Some(actor));

        let employe = NewHistoryEntry::by(actor, Role::Employe, Uuid::nil(), HistoryAction::Paiement);
        assert!(!employe.is_auto_approved());
        assert_eq!(employe.admin_validation_id, None);
    }

    #[test]
    fn blank_comments_are_dropped() {
        let e = NewHistoryEntry::by(Uuid::nil(), Role::Admin, Uuid::nil(), HistoryAction::Paiement)
            .comment(Some("   ".into()));
        assert_eq!(e.commentaire, None);
    }

    #[test]
    fn replay_reconstructs_balance_in_seq_order() {
        // prix 50000: avance 20000, paiement 10000, paiement 15000 rejeté puis corrigé
        let entries = vec![
            entry(4, HistoryAction::Correction, -15000, 20000),
            entry(1, HistoryAction::Creation, 20000, 30000),
            entry(3, HistoryAction::Paiement, 15000, 5000),
            entry(2, HistoryAction::Paiement, 10000, 20000),
        ];
        let replayed = replay(&entries).unwrap();
        assert_eq!(replayed.avance, Decimal::new(30000, 0));
        assert_eq!(replayed.reste, Decimal::new(20000, 0));
    }

    #[test]
    fn rejected_requests_do_not_move_the_balance() {
        let mut rejected_close = entry(3, HistoryAction::FermetureDemande, 0, 999);
        rejected_close.statut_validation = ValidationStatus::Rejetee;
        let entries = vec![
            entry(1, HistoryAction::Creation, 100, 400),
            entry(2, HistoryAction::Paiement, 150, 250),
            rejected_close,
        ];
        let replayed = replay(&entries).unwrap();
        assert_eq!(replayed.avance, Decimal::new(250, 0));
        assert_eq!(replayed.reste, Decimal::new(250, 0));
    }

    #[test]
    fn replay_of_empty_history_is_none() {
        assert_eq!(replay(&[]), None);
    }
}
