// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::providers::fillers::BlobGasFiller;
use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, Bytes, B256, U256},
    providers::fillers::{
        ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
    },
    providers::{Identity, Provider, ProviderBuilder, RootProvider},
    rpc::types::TransactionReceipt,
    signers::local::PrivateKeySigner,
    sol,
};
use async_trait::async_trait;
use eyre::Result;
use once_cell::sync::Lazy;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;

static NONCE_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub async fn next_pending_nonce<P>(provider: &P, from: Address) -> eyre::Result<u64>
where
    P: Provider<Ethereum> + Send + Sync,
{
    provider
        .get_transaction_count(from)
        .pending()
        .await
        .map_err(Into::into)
}

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    contract ReviewManager {
        // Accepts one encrypted score handle plus the batch validity proof.
        function submitReview(uint256 paperId, bytes32 scoreHandle, bytes calldata inputProof) external returns (bool success);
        function getCount(uint256 paperId) external view returns (uint256 count);
        // As a transaction: recomputes the encrypted average and grants the
        // sender permission to decrypt the resulting handle. As an eth_call
        // with the same sender: returns that freshly authorized handle.
        function getAverage(uint256 paperId) external returns (bytes32 handle);
    }
}

/// Trait for read-only operations on the ReviewManager contract
#[async_trait]
pub trait ReviewRead {
    /// Number of reviews recorded for a paper
    async fn get_count(&self, paper_id: U256) -> Result<U256>;

    /// Current average handle, read as an eth_call from the caller identity
    async fn get_average_handle(&self, paper_id: U256) -> Result<B256>;
}

/// Trait for write operations on the ReviewManager contract
#[async_trait]
pub trait ReviewWrite {
    /// Submit one encrypted score with its validity proof
    async fn submit_review(
        &self,
        paper_id: U256,
        score_handle: B256,
        input_proof: Bytes,
    ) -> Result<TransactionReceipt>;

    /// The authorizing call: recompute the average and grant the sender
    /// decryption rights on the fresh handle. Returns only once the
    /// transaction receipt is in, i.e. the grant is durably finalized.
    async fn authorize_average(&self, paper_id: U256) -> Result<TransactionReceipt>;
}

/// Generic type to represent different provider types
pub trait ProviderType: Send {
    type Provider: Provider + Send + Sync + 'static;
}

/// Marker type for read-write provider
#[derive(Clone)]
pub struct ReadWrite;
impl ProviderType for ReadWrite {
    type Provider = ReviewWriteProvider;
}

/// Generic ReviewManager contract
#[derive(Clone)]
pub struct ReviewManagerContract<T: ProviderType> {
    pub provider: Arc<T::Provider>,
    pub contract_address: Address,
    signer_address: Address,
    _marker: PhantomData<T>,
}

impl ReviewManagerContract<ReadWrite> {
    pub async fn new(
        http_rpc_url: &str,
        private_key: &str,
        contract_address: &str,
    ) -> Result<ReviewManagerContract<ReadWrite>> {
        ReviewManagerContractFactory::create_write(http_rpc_url, contract_address, private_key)
            .await
    }

    pub fn get_provider(&self) -> Arc<ReviewWriteProvider> {
        self.provider.clone()
    }

    pub fn address(&self) -> &Address {
        &self.contract_address
    }

    /// The identity every call and transaction is issued from.
    pub fn signer_address(&self) -> Address {
        self.signer_address
    }
}

/// Type alias for read-write provider
pub type ReviewWriteProvider = FillProvider<
    JoinFill<
        JoinFill<
            JoinFill<
                Identity,
                JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
            >,
            WalletFiller<EthereumWallet>,
        >,
        NonceFiller,
    >,
    RootProvider<Ethereum>,
    Ethereum,
>;

/// Type alias for the write-capable contract variant
pub type ReviewWriteContract = ReviewManagerContract<ReadWrite>;

// Factory for creating contract instances
pub struct ReviewManagerContractFactory;

impl ReviewManagerContractFactory {
    /// Create a write-capable contract
    pub async fn create_write(
        http_rpc_url: &str,
        contract_address: &str,
        private_key: &str,
    ) -> Result<ReviewManagerContract<ReadWrite>> {
        let contract_address = contract_address.parse()?;

        let signer: PrivateKeySigner = private_key.parse()?;
        let signer_address = signer.address();
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .with_cached_nonce_management()
            .connect(http_rpc_url)
            .await?;

        Ok(ReviewManagerContract::<ReadWrite> {
            provider: Arc::new(provider),
            contract_address,
            signer_address,
            _marker: PhantomData,
        })
    }
}

// Implement ReviewRead for any ReviewManagerContract regardless of provider type
#[async_trait]
impl<T: Send + Sync> ReviewRead for ReviewManagerContract<T>
where
    T: ProviderType,
{
    async fn get_count(&self, paper_id: U256) -> Result<U256> {
        let contract = ReviewManager::new(self.contract_address, &self.provider);
        let count = contract.getCount(paper_id).call().await?;
        Ok(count)
    }

    async fn get_average_handle(&self, paper_id: U256) -> Result<B256> {
        let contract = ReviewManager::new(self.contract_address, &self.provider);
        // The contract scopes the returned handle to msg.sender; the
        // eth_call must carry the same identity as the authorizing tx.
        let handle = contract
            .getAverage(paper_id)
            .from(self.signer_address)
            .call()
            .await?;
        Ok(handle)
    }
}

// Implement ReviewWrite only for contracts with ReadWrite marker
#[async_trait]
impl ReviewWrite for ReviewManagerContract<ReadWrite> {
    async fn submit_review(
        &self,
        paper_id: U256,
        score_handle: B256,
        input_proof: Bytes,
    ) -> Result<TransactionReceipt> {
        let _guard = NONCE_LOCK.lock().await;
        let nonce = next_pending_nonce(&*self.provider, self.signer_address()).await?;

        let contract = ReviewManager::new(self.contract_address, &self.provider);
        let builder = contract
            .submitReview(paper_id, score_handle, input_proof)
            .nonce(nonce);
        let receipt = builder.send().await?.get_receipt().await?;

        Ok(receipt)
    }

    async fn authorize_average(&self, paper_id: U256) -> Result<TransactionReceipt> {
        let _guard = NONCE_LOCK.lock().await;
        let nonce = next_pending_nonce(&*self.provider, self.signer_address()).await?;

        let contract = ReviewManager::new(self.contract_address, &self.provider);
        let builder = contract.getAverage(paper_id).nonce(nonce);
        let receipt = builder.send().await?.get_receipt().await?;

        Ok(receipt)
    }
}
