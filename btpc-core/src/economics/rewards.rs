//! Linear decay reward calculation for BTPC
//!
//! BTPC implements a linear decay reward system that starts at 32.375 BTPC and
//! decreases linearly over 24 years to a tail emission of 0.5 BTPC per block.

use crate::economics::constants::*;

/// Calculator for block rewards following the linear decay schedule
pub struct RewardCalculator;

impl RewardCalculator {
    /// Calculate the block reward for a given height
    ///
    /// # Formula
    /// - Initial reward: 32.375 BTPC (3,237,500,000 credits)
    /// - Tail emission: 0.5 BTPC (50,000,000 credits)
    /// - Linear decay over 24 years (1,261,440 blocks)
    ///
    /// For height < DECAY_END_HEIGHT:
    /// reward = INITIAL_REWARD - (height * decrease_per_block)
    ///
    /// For height >= DECAY_END_HEIGHT:
    /// reward = TAIL_EMISSION
    pub fn calculate_block_reward(height: u32) -> u64 {
        if height >= DECAY_END_HEIGHT {
            // After 24 years, constant tail emission
            return TAIL_EMISSION;
        }

        // Linear decay calculation
        let total_decrease = INITIAL_REWARD - TAIL_EMISSION;
        let decrease_per_block = total_decrease / (DECAY_END_HEIGHT as u64);
        let total_decrease_at_height = (height as u64) * decrease_per_block;

        // Ensure we don't go below tail emission
        if total_decrease_at_height >= total_decrease {
            TAIL_EMISSION
        } else {
            INITIAL_REWARD - total_decrease_at_height
        }
    }

    /// Calculate the total supply up to a given height
    pub fn calculate_total_supply(height: u32) -> u64 {
        if height == 0 {
            return INITIAL_REWARD; // Genesis block
        }

        let mut total_supply = 0u64;

        if height <= DECAY_END_HEIGHT {
            // Sum of arithmetic sequence for decay period
            let blocks_in_decay = height as u64;
            let first_reward = INITIAL_REWARD;
            let last_reward = Self::calculate_block_reward(height - 1);

            // Sum = n/2 * (first + last)
            total_supply = blocks_in_decay * (first_reward + last_reward) / 2;
        } else {
            // Decay period complete, add tail emission blocks
            let decay_blocks = DECAY_END_HEIGHT as u64;
            let tail_blocks = (height - DECAY_END_HEIGHT) as u64;

            // Sum of decay period (arithmetic sequence)
            let decay_supply = decay_blocks * (INITIAL_REWARD + TAIL_EMISSION) / 2;

            // Add tail emission blocks
            let tail_supply = tail_blocks * TAIL_EMISSION;

            total_supply = decay_supply + tail_supply;
        }

        total_supply
    }

    /// Calculate the expected total supply at a given height (for validation)
    pub fn calculate_expected_supply(height: u32) -> u64 {
        Self::calculate_total_supply(height)
    }

    /// Get the current inflation rate as a percentage
    pub fn calculate_inflation_rate(height: u32) -> f64 {
        if height == 0 {
            return 0.0;
        }

        let current_supply = Self::calculate_total_supply(height);
        let annual_emission = Self::calculate_block_reward(height) * (BLOCKS_PER_YEAR as u64);

        (annual_emission as f64 / current_supply as f64) * 100.0
    }

    /// Get statistics about the reward schedule
    pub fn get_reward_schedule_info() -> RewardScheduleInfo {
        RewardScheduleInfo {
            initial_reward: INITIAL_REWARD,
            tail_emission: TAIL_EMISSION,
            decay_duration_years: DECAY_DURATION_YEARS,
            decay_duration_blocks: DECAY_END_HEIGHT,
            blocks_per_year: BLOCKS_PER_YEAR,
            total_decay_amount: INITIAL_REWARD - TAIL_EMISSION,
        }
    }

    /// Calculate rewards for multiple consecutive blocks efficiently
    pub fn calculate_block_rewards_batch(start_height: u32, count: u32) -> Vec<u64> {
        let mut rewards = Vec::with_capacity(count as usize);

        for height in start_height..(start_height + count) {
            rewards.push(Self::calculate_block_reward(height));
        }

        rewards
    }

    /// Validate that a claimed reward is correct for the given height
    pub fn validate_block_reward(claimed_reward: u64, height: u32) -> bool {
        let expected_reward = Self::calculate_block_reward(height);
        claimed_reward == expected_reward
    }

    /// Calculate the decrease per block during decay period
    pub fn get_decrease_per_block() -> u64 {
        let total_decrease = INITIAL_REWARD - TAIL_EMISSION;
        total_decrease / (DECAY_END_HEIGHT as u64)
    }

    /// Check if we're currently in the decay period
    pub fn is_in_decay_period(height: u32) -> bool {
        height < DECAY_END_HEIGHT
    }

    /// Check if we've reached tail emission
    pub fn is_tail_emission(height: u32) -> bool {
        height >= DECAY_END_HEIGHT
    }

    /// Get the year number for a given height (0-indexed)
    pub fn get_year_from_height(height: u32) -> u32 {
        height / BLOCKS_PER_YEAR
    }

    /// Get the height at the start of a given year
    pub fn get_height_from_year(year: u32) -> u32 {
        year * BLOCKS_PER_YEAR
    }
}

/// Information about the reward schedule
#[derive(Debug, Clone)]
pub struct RewardScheduleInfo {
    pub initial_reward: u64,
    pub tail_emission: u64,
    pub decay_duration_years: u32,
    pub decay_duration_blocks: u32,
    pub blocks_per_year: u32,
    pub total_decay_amount: u64,
}
